//! Error types for tripod-tree.

/// Errors from backtracking-tree induction.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the training index set is empty.
    #[error("training index set is empty")]
    EmptyTrainingSet,

    /// Returned when descriptor and ray lists have different lengths.
    #[error("descriptor/ray length mismatch: {descriptors} descriptors, {rays} rays")]
    LengthMismatch {
        /// Number of descriptor rows supplied.
        descriptors: usize,
        /// Number of ray rows supplied.
        rays: usize,
    },

    /// Returned when a training index points outside the dataset.
    #[error("index {index} out of bounds for {len} rows")]
    IndexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Number of rows in the dataset.
        len: usize,
    },

    /// Returned when an indexed row disagrees on descriptor dimensionality.
    #[error("row {row} has {got} descriptor dimensions, expected {expected}")]
    DescriptorDimMismatch {
        /// Dimensionality of the first indexed row.
        expected: usize,
        /// Dimensionality of the offending row.
        got: usize,
        /// The offending row.
        row: usize,
    },

    /// Returned when an indexed row disagrees on ray dimensionality.
    #[error("row {row} has {got} ray dimensions, expected {expected}")]
    RayDimMismatch {
        /// Dimensionality of the first indexed row.
        expected: usize,
        /// Dimensionality of the offending row.
        got: usize,
        /// The offending row.
        row: usize,
    },

    /// Returned when a descriptor or ray value is NaN or infinite.
    #[error("non-finite value in row {row}, column {column}")]
    NonFiniteValue {
        /// The offending row.
        row: usize,
        /// The offending column.
        column: usize,
    },

    /// Returned when indexed rows have zero descriptor dimensions.
    #[error("descriptors have zero dimensions")]
    ZeroDescriptorDims,

    /// Returned when `max_depth` is set to zero.
    #[error("max_depth must be at least 1 when set")]
    InvalidMaxDepth,

    /// Returned when `min_leaf_size` is zero.
    #[error("min_leaf_size must be at least 1, got {min_leaf_size}")]
    InvalidMinLeafSize {
        /// The rejected value.
        min_leaf_size: usize,
    },

    /// Returned when `candidate_dims` is zero.
    #[error("candidate_dims must be at least 1, got {candidate_dims}")]
    InvalidCandidateDims {
        /// The rejected value.
        candidate_dims: usize,
    },

    /// Returned when `candidate_thresholds` is zero.
    #[error("candidate_thresholds must be at least 1, got {candidate_thresholds}")]
    InvalidCandidateThresholds {
        /// The rejected value.
        candidate_thresholds: usize,
    },
}
