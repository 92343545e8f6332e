//! Configuration builder for ensemble training.

use std::path::Path;

use serde::Serialize;

use crate::error::ForestError;
use crate::result::TrainingResult;
use crate::sample::{FrameId, SampleSource};
use crate::tree::Tree;

/// Configuration for training a pan/tilt regression forest.
///
/// Construct via [`ForestConfig::new`], then chain `with_*` methods.
/// `C` is the induction config shared by every ensemble member.
///
/// # Defaults
///
/// | Parameter         | Default      |
/// |-------------------|--------------|
/// | `frames_per_tree` | 32           |
/// | `principal_point` | `[0.0, 0.0]` |
/// | `seed`            | 42           |
#[derive(Debug, Clone)]
pub struct ForestConfig<C> {
    pub(crate) n_trees: usize,
    pub(crate) frames_per_tree: usize,
    pub(crate) principal_point: [f64; 2],
    pub(crate) seed: u64,
    pub(crate) tree: C,
}

impl<C: Clone> ForestConfig<C> {
    /// Create a config with the given ensemble size and member config.
    ///
    /// # Errors
    ///
    /// Returns [`ForestError::InvalidTreeCount`] if `n_trees` is zero.
    pub fn new(n_trees: usize, tree: C) -> Result<Self, ForestError> {
        if n_trees == 0 {
            return Err(ForestError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            frames_per_tree: 32,
            principal_point: [0.0, 0.0],
            seed: 42,
            tree,
        })
    }

    // --- Setters ---

    /// Set the number of frames drawn (with replacement) per member.
    ///
    /// Capped at the pool size during training; zero is rejected there.
    #[must_use]
    pub fn with_frames_per_tree(mut self, frames_per_tree: usize) -> Self {
        self.frames_per_tree = frames_per_tree;
        self
    }

    /// Set the principal point (image center) for ray back-projection.
    #[must_use]
    pub fn with_principal_point(mut self, principal_point: [f64; 2]) -> Self {
        self.principal_point = principal_point;
        self
    }

    /// Set the master RNG seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    // --- Getters ---

    /// Return the ensemble size.
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    /// Return the per-member frame draw count.
    #[must_use]
    pub fn frames_per_tree(&self) -> usize {
        self.frames_per_tree
    }

    /// Return the principal point.
    #[must_use]
    pub fn principal_point(&self) -> [f64; 2] {
        self.principal_point
    }

    /// Return the master RNG seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the member induction config.
    #[must_use]
    pub fn tree(&self) -> &C {
        &self.tree
    }

    /// Train an ensemble over the given frame pool.
    ///
    /// Each member draws `frames_per_tree` frames uniformly with
    /// replacement, extracts their samples through `source`, and fits one
    /// tree with a seed derived from the master RNG. With `checkpoint`
    /// set, the partial ensemble is saved there after every member.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::EmptyFramePool`] | `frames` is empty |
    /// | [`ForestError::InvalidFrameSampleCount`] | `frames_per_tree` is zero |
    /// | [`ForestError::EmptyMemberBatch`] | a member drew zero samples in total |
    /// | [`ForestError::SampleGeneration`] | the source failed on a frame |
    /// | [`ForestError::TreeInduction`] | member induction failed |
    /// | [`ForestError::SerializeModel`] | checkpoint encoding failed |
    /// | [`ForestError::WriteModel`] | checkpoint write failed |
    pub fn train<S, T>(
        &self,
        source: &S,
        frames: &[FrameId],
        checkpoint: Option<&Path>,
    ) -> Result<TrainingResult<T>, ForestError>
    where
        S: SampleSource,
        T: Tree<Config = C> + Serialize + Clone,
        C: Serialize,
    {
        crate::trainer::train(self, source, frames, checkpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct StubTreeConfig {
        depth: usize,
    }

    #[test]
    fn new_applies_defaults() {
        let config = ForestConfig::new(8, StubTreeConfig { depth: 3 }).unwrap();
        assert_eq!(config.n_trees(), 8);
        assert_eq!(config.frames_per_tree(), 32);
        assert_eq!(config.principal_point(), [0.0, 0.0]);
        assert_eq!(config.seed(), 42);
        assert_eq!(config.tree(), &StubTreeConfig { depth: 3 });
    }

    #[test]
    fn zero_trees_rejected() {
        let result = ForestConfig::new(0, StubTreeConfig { depth: 3 });
        assert!(matches!(
            result,
            Err(ForestError::InvalidTreeCount { n_trees: 0 })
        ));
    }

    #[test]
    fn builder_chain_overrides_defaults() {
        let config = ForestConfig::new(4, StubTreeConfig { depth: 1 })
            .unwrap()
            .with_frames_per_tree(10)
            .with_principal_point([640.0, 360.0])
            .with_seed(7);
        assert_eq!(config.frames_per_tree(), 10);
        assert_eq!(config.principal_point(), [640.0, 360.0]);
        assert_eq!(config.seed(), 7);
    }
}
