//! The trained ensemble and its prediction policy.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::error::ForestError;
use crate::tree::{Candidate, Tree};

/// Descriptor and ray dimensionality, fixed by the first trained member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Dims {
    pub(crate) feature: usize,
    pub(crate) ray: usize,
}

/// An ensemble of regression trees mapping keypoint descriptors to
/// pan/tilt rays.
///
/// Built by [`ForestConfig::train`](crate::ForestConfig::train) or loaded
/// from disk with [`RayForest::load`].
#[derive(Debug, Clone)]
pub struct RayForest<T: Tree> {
    pub(crate) trees: Vec<T>,
    pub(crate) dims: Option<Dims>,
    pub(crate) tree_config: T::Config,
}

impl<T: Tree> RayForest<T> {
    /// Return the number of trained members.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Return `true` if no member has been trained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    /// Return the descriptor dimensionality, once fixed by training.
    #[must_use]
    pub fn feature_dim(&self) -> Option<usize> {
        self.dims.map(|d| d.feature)
    }

    /// Return the ray dimensionality, once fixed by training.
    #[must_use]
    pub fn ray_dim(&self) -> Option<usize> {
        self.dims.map(|d| d.ray)
    }

    /// Return the induction config shared by the members.
    #[must_use]
    pub fn tree_config(&self) -> &T::Config {
        &self.tree_config
    }

    /// Query the ensemble with the given per-member search budget.
    ///
    /// Every member contributes its best candidate; candidates come back
    /// sorted by ascending descriptor distance and truncated to `budget`.
    /// A budget of zero yields no candidates.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::UntrainedModel`] | no member has been trained |
    /// | [`ForestError::FeatureDimMismatch`] | descriptor length differs from the model's |
    pub fn predict(
        &self,
        descriptor: &[f64],
        budget: usize,
    ) -> Result<Vec<Candidate>, ForestError> {
        let dims = self.dims.ok_or(ForestError::UntrainedModel)?;
        if descriptor.len() != dims.feature {
            return Err(ForestError::FeatureDimMismatch {
                expected: dims.feature,
                got: descriptor.len(),
            });
        }

        let mut candidates: Vec<Candidate> = self
            .trees
            .iter()
            .map(|tree| tree.predict(descriptor, budget))
            .collect();
        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(budget);
        Ok(candidates)
    }

    /// Query a batch of descriptors in parallel.
    ///
    /// # Errors
    ///
    /// Same as [`RayForest::predict`], for any descriptor in the batch.
    pub fn predict_batch(
        &self,
        descriptors: &[Vec<f64>],
        budget: usize,
    ) -> Result<Vec<Vec<Candidate>>, ForestError> {
        descriptors
            .into_par_iter()
            .map(|descriptor| self.predict(descriptor, budget))
            .collect()
    }
}
