//! Holdout validation: per-round ensemble error on whole-frame sample sets.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::ForestError;
use crate::model::RayForest;
use crate::sample::{FrameId, SampleSource};
use crate::summary::ErrorSummary;
use crate::tree::Tree;

/// Per-member search budget used for validation queries.
const SEARCH_BUDGET: usize = 4;

/// Holdout validation configuration.
///
/// Construct via [`HoldoutValidation::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter         | Default      |
/// |-------------------|--------------|
/// | `seed`            | 42           |
/// | `principal_point` | `[0.0, 0.0]` |
#[derive(Debug, Clone)]
pub struct HoldoutValidation {
    rounds: usize,
    seed: u64,
    principal_point: [f64; 2],
}

/// Diagnostics for one validation round (one frame).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundSummary {
    /// The frame evaluated this round.
    pub frame: FrameId,
    /// Number of samples the frame yielded.
    pub n_samples: usize,
    /// Quartiles of absolute ensemble error across the frame's samples.
    pub error: ErrorSummary,
    /// Median descriptor distance of the winning candidates.
    pub median_distance: f64,
}

/// Result of a holdout validation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// One summary per evaluated round; zero-sample rounds are skipped.
    pub rounds: Vec<RoundSummary>,
}

impl HoldoutValidation {
    /// Create a validation config with the given number of rounds.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidRoundCount`] if `rounds` is zero.
    pub fn new(rounds: usize) -> Result<Self, ForestError> {
        if rounds == 0 {
            return Err(ForestError::InvalidRoundCount { rounds });
        }
        Ok(Self {
            rounds,
            seed: 42,
            principal_point: [0.0, 0.0],
        })
    }

    /// Set the RNG seed for frame draws.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the principal point (image center) for ray back-projection.
    ///
    /// Must match the value the model was trained with.
    #[must_use]
    pub fn with_principal_point(mut self, principal_point: [f64; 2]) -> Self {
        self.principal_point = principal_point;
        self
    }

    /// Return the number of rounds.
    #[must_use]
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Evaluate the model over randomly drawn frames.
    ///
    /// Each round draws one frame uniformly from the whole pool, extracts
    /// its samples, and queries the ensemble per sample with a search
    /// budget of 4; the minimum-distance candidate wins. The round reports
    /// per-dimension error quartiles and the median winning distance.
    /// Rounds whose frame yields zero samples are skipped with a warning.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::EmptyFramePool`] | `frames` is empty |
    /// | [`ForestError::SampleGeneration`] | the source failed on a frame |
    /// | [`ForestError::UntrainedModel`] | the model has no members |
    /// | [`ForestError::FeatureDimMismatch`] | a descriptor disagrees with the model |
    #[instrument(skip_all, fields(rounds = self.rounds, pool = frames.len()))]
    pub fn evaluate<S, T>(
        &self,
        model: &RayForest<T>,
        source: &S,
        frames: &[FrameId],
    ) -> Result<ValidationResult, ForestError>
    where
        S: SampleSource,
        T: Tree,
    {
        if frames.is_empty() {
            return Err(ForestError::EmptyFramePool);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut rounds = Vec::with_capacity(self.rounds);

        for round in 0..self.rounds {
            let frame = &frames[rng.gen_range(0..frames.len())];
            let samples = source
                .generate(frame, self.principal_point)
                .map_err(|e| ForestError::SampleGeneration {
                    frame: frame.as_str().to_string(),
                    source: Box::new(e),
                })?;

            if samples.is_empty() {
                warn!(round, frame = %frame, "frame yielded zero samples, skipping round");
                continue;
            }

            let n_samples = samples.len();
            let outcomes: Vec<(Vec<f64>, f64)> = samples
                .into_par_iter()
                .map(|sample| {
                    let candidates = model.predict(&sample.descriptor, SEARCH_BUDGET)?;
                    let best = candidates
                        .into_iter()
                        .min_by(|a, b| a.distance.total_cmp(&b.distance))
                        .ok_or(ForestError::UntrainedModel)?;
                    let error: Vec<f64> = best
                        .ray
                        .iter()
                        .zip(&sample.ray)
                        .map(|(predicted, truth)| (predicted - truth).abs())
                        .collect();
                    Ok((error, best.distance))
                })
                .collect::<Result<_, ForestError>>()?;

            let (errors, mut distances): (Vec<Vec<f64>>, Vec<f64>) = outcomes.into_iter().unzip();
            distances.sort_by(|a, b| a.total_cmp(b));
            let median_distance = distances[distances.len() / 2];
            let error = ErrorSummary::from_errors(&errors)?;

            info!(
                round,
                frame = %frame,
                n_samples,
                median_distance,
                "validation round complete"
            );

            rounds.push(RoundSummary {
                frame: frame.clone(),
                n_samples,
                error,
                median_distance,
            });
        }

        info!(evaluated = rounds.len(), "validation complete");
        Ok(ValidationResult { rounds })
    }
}
