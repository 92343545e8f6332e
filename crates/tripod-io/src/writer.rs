//! JSON report writer for training, validation, and selection outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};
use tripod_forest::{MemberSummary, RoundSummary, TrainingMetadata, ValidationResult};

use crate::domain::RunName;
use crate::IoError;

/// Writes pipeline reports to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{run}_training.json`, `{run}_validation.json`,
/// and `{run}_selection.json`.
pub struct ReportWriter {
    output_dir: PathBuf,
    run: RunName,
}

impl ReportWriter {
    /// Create a new writer targeting the given directory and run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), run = %run))]
    pub fn new(output_dir: &Path, run: RunName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            run,
        })
    }

    /// Write a training report to `{run}_training.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_training(
        &self,
        metadata: &TrainingMetadata,
        members: &[MemberSummary],
    ) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_training.json", self.run.as_str()));

        let artifact = TrainingArtifact {
            run: self.run.as_str(),
            metadata,
            members,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "training report written");
        Ok(())
    }

    /// Write a validation report to `{run}_validation.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_validation(&self, result: &ValidationResult) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_validation.json", self.run.as_str()));

        let artifact = ValidationArtifact {
            run: self.run.as_str(),
            n_rounds: result.rounds.len(),
            rounds: &result.rounds,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "validation report written");
        Ok(())
    }

    /// Write a sample selection report to `{run}_selection.json`.
    ///
    /// `pool` is the number of candidate samples the selector examined;
    /// `indices` are the kept ones.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_selection(&self, indices: &[usize], pool: usize) -> Result<(), IoError> {
        let path = self
            .output_dir
            .join(format!("{}_selection.json", self.run.as_str()));

        let ratio = if pool == 0 {
            0.0
        } else {
            indices.len() as f64 / pool as f64
        };
        let artifact = SelectionArtifact {
            run: self.run.as_str(),
            pool,
            n_selected: indices.len(),
            ratio,
            indices,
        };

        let json = serde_json::to_string_pretty(&artifact).expect("serialization cannot fail");
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "selection report written");
        Ok(())
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything; just computes `{output_dir}/{run}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_model.bin", self.run.as_str()))
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct TrainingArtifact<'a> {
    run: &'a str,
    metadata: &'a TrainingMetadata,
    members: &'a [MemberSummary],
}

#[derive(Serialize)]
struct ValidationArtifact<'a> {
    run: &'a str,
    n_rounds: usize,
    rounds: &'a [RoundSummary],
}

#[derive(Serialize)]
struct SelectionArtifact<'a> {
    run: &'a str,
    pool: usize,
    n_selected: usize,
    ratio: f64,
    indices: &'a [usize],
}
