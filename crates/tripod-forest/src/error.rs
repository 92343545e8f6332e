//! Error types for tripod-forest.

use std::path::PathBuf;

/// Errors from ensemble training, evaluation, selection, and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    /// Returned when the requested ensemble size is zero.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The rejected ensemble size.
        n_trees: usize,
    },

    /// Returned when the per-member frame draw count is zero.
    #[error("frames_per_tree must be at least 1, got {frames_per_tree}")]
    InvalidFrameSampleCount {
        /// The rejected draw count.
        frames_per_tree: usize,
    },

    /// Returned when the validation round count is zero.
    #[error("rounds must be at least 1, got {rounds}")]
    InvalidRoundCount {
        /// The rejected round count.
        rounds: usize,
    },

    /// Returned when training or validation is requested over an empty
    /// frame pool.
    #[error("frame pool is empty")]
    EmptyFramePool,

    /// Returned when a member's bootstrap draw yields zero samples in total.
    #[error("ensemble member {member} drew zero samples across {n_frames} frames")]
    EmptyMemberBatch {
        /// Zero-based index of the failing member.
        member: usize,
        /// Number of frames the member drew.
        n_frames: usize,
    },

    /// Returned when the sample source fails on a frame.
    #[error("sample extraction failed for frame \"{frame}\"")]
    SampleGeneration {
        /// The frame that failed.
        frame: String,
        /// The underlying source error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when tree induction fails for an ensemble member.
    #[error("tree induction failed for ensemble member {member}")]
    TreeInduction {
        /// Zero-based index of the failing member.
        member: usize,
        /// The underlying induction error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when a quartile summary is requested over zero error rows.
    #[error("error batch has zero rows")]
    EmptyErrorBatch,

    /// Returned when error rows disagree on output dimensionality.
    #[error("error row {index} has {got} dimensions, expected {expected}")]
    RaggedErrorBatch {
        /// Dimensionality of the first row.
        expected: usize,
        /// Dimensionality of the offending row.
        got: usize,
        /// Zero-based index of the offending row.
        index: usize,
    },

    /// Returned when descriptor and ray lists have different lengths.
    #[error("descriptor/ray length mismatch: {descriptors} descriptors, {rays} rays")]
    LengthMismatch {
        /// Number of descriptors supplied.
        descriptors: usize,
        /// Number of rays supplied.
        rays: usize,
    },

    /// Returned when querying a model that has no trained members.
    #[error("model has no trained members")]
    UntrainedModel,

    /// Returned when a query descriptor disagrees with the model's
    /// training dimensionality.
    #[error("query descriptor has {got} dimensions, expected {expected}")]
    FeatureDimMismatch {
        /// Dimensionality the model was trained with.
        expected: usize,
        /// Dimensionality of the query.
        got: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// The path that could not be decoded.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a model file carries an unsupported format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
        /// The offending file.
        path: PathBuf,
    },
}
