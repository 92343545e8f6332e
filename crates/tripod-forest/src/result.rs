//! Training result types.

use serde::Serialize;

use crate::model::RayForest;
use crate::summary::ErrorSummary;
use crate::tree::Tree;

/// Metadata about one training run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingMetadata {
    /// Number of members trained.
    pub n_trees: usize,
    /// Descriptor dimensionality fixed by the first member.
    pub feature_dim: usize,
    /// Ray dimensionality fixed by the first member.
    pub ray_dim: usize,
    /// Number of frames in the training pool.
    pub n_frames_pool: usize,
    /// Frames drawn per member, after capping at the pool size.
    pub frames_per_tree: usize,
    /// Master RNG seed the run used.
    pub seed: u64,
}

/// Per-member training diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSummary {
    /// Zero-based member index.
    pub member: usize,
    /// Distinct frames in the member's bootstrap draw.
    pub n_distinct_frames: usize,
    /// Total samples the member trained on.
    pub n_samples: usize,
    /// Quartiles of absolute budget-1 error on the member's own batch.
    pub training_error: ErrorSummary,
}

/// Result of ensemble training: the model plus per-member diagnostics.
#[derive(Debug)]
pub struct TrainingResult<T: Tree> {
    forest: RayForest<T>,
    members: Vec<MemberSummary>,
    metadata: TrainingMetadata,
}

impl<T: Tree> TrainingResult<T> {
    pub(crate) fn new(
        forest: RayForest<T>,
        members: Vec<MemberSummary>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            members,
            metadata,
        }
    }

    /// Borrow the trained ensemble.
    #[must_use]
    pub fn forest(&self) -> &RayForest<T> {
        &self.forest
    }

    /// Consume the result and return the ensemble.
    #[must_use]
    pub fn into_forest(self) -> RayForest<T> {
        self.forest
    }

    /// Return the per-member training summaries.
    #[must_use]
    pub fn members(&self) -> &[MemberSummary] {
        &self.members
    }

    /// Return the run metadata.
    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
