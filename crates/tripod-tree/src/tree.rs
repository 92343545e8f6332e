//! Backtracking regression tree: config, induction, and prediction.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use tripod_forest::{Candidate, Tree};

use crate::error::TreeError;
use crate::node::{Node, NodeIndex};
use crate::search::backtracking_search;
use crate::split::find_split;

/// Configuration for a single backtracking regression tree.
///
/// Construct via [`BacktrackingTreeConfig::new`], then chain `with_*`
/// methods. Validation happens at fit time.
///
/// # Defaults
///
/// | Parameter              | Default            |
/// |------------------------|--------------------|
/// | `max_depth`            | `None` (unlimited) |
/// | `min_leaf_size`        | 4                  |
/// | `candidate_dims`       | 8                  |
/// | `candidate_thresholds` | 10                 |
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktrackingTreeConfig {
    max_depth: Option<usize>,
    min_leaf_size: usize,
    candidate_dims: usize,
    candidate_thresholds: usize,
}

impl BacktrackingTreeConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_depth: None,
            min_leaf_size: 4,
            candidate_dims: 8,
            candidate_thresholds: 10,
        }
    }

    // --- Setters ---

    /// Set the maximum tree depth.
    ///
    /// `None` grows until leaves shrink to `min_leaf_size` or no valid
    /// split remains; `Some(d)` additionally caps the depth at `d` levels
    /// below the root.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the row count at or below which a node becomes a leaf.
    #[must_use]
    pub fn with_min_leaf_size(mut self, min_leaf_size: usize) -> Self {
        self.min_leaf_size = min_leaf_size;
        self
    }

    /// Set the number of random descriptor dimensions tried per split.
    #[must_use]
    pub fn with_candidate_dims(mut self, candidate_dims: usize) -> Self {
        self.candidate_dims = candidate_dims;
        self
    }

    /// Set the number of random thresholds tried per candidate dimension.
    #[must_use]
    pub fn with_candidate_thresholds(mut self, candidate_thresholds: usize) -> Self {
        self.candidate_thresholds = candidate_thresholds;
        self
    }

    // --- Getters ---

    /// Return the maximum depth, if capped.
    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Return the minimum leaf size.
    #[must_use]
    pub fn min_leaf_size(&self) -> usize {
        self.min_leaf_size
    }

    /// Return the candidate dimension count.
    #[must_use]
    pub fn candidate_dims(&self) -> usize {
        self.candidate_dims
    }

    /// Return the candidate threshold count.
    #[must_use]
    pub fn candidate_thresholds(&self) -> usize {
        self.candidate_thresholds
    }
}

impl Default for BacktrackingTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A fitted backtracking regression tree.
///
/// Leaves store the mean ray and descriptor centroid of their training
/// rows; prediction runs a best-first search that re-descends the most
/// marginal untaken branches until its leaf budget is spent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktrackingTree {
    nodes: Vec<Node>,
    n_dims: usize,
}

impl BacktrackingTree {
    /// Return the total number of nodes, splits and leaves.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_leaf()).count()
    }

    /// Return the descriptor dimensionality the tree was trained on.
    #[must_use]
    pub fn n_dims(&self) -> usize {
        self.n_dims
    }
}

impl Tree for BacktrackingTree {
    type Config = BacktrackingTreeConfig;
    type Error = TreeError;

    /// Build a tree over the indexed rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`TreeError::EmptyTrainingSet`] | `indices` is empty |
    /// | [`TreeError::LengthMismatch`] | descriptor and ray counts differ |
    /// | [`TreeError::IndexOutOfBounds`] | an index exceeds the dataset |
    /// | [`TreeError::DescriptorDimMismatch`] | ragged descriptor rows |
    /// | [`TreeError::RayDimMismatch`] | ragged ray rows |
    /// | [`TreeError::NonFiniteValue`] | NaN or infinite input |
    /// | [`TreeError::ZeroDescriptorDims`] | descriptors have no columns |
    /// | [`TreeError::InvalidMaxDepth`] | `max_depth` set to zero |
    /// | [`TreeError::InvalidMinLeafSize`] | `min_leaf_size` is zero |
    /// | [`TreeError::InvalidCandidateDims`] | `candidate_dims` is zero |
    /// | [`TreeError::InvalidCandidateThresholds`] | `candidate_thresholds` is zero |
    #[instrument(skip_all, fields(n_rows = indices.len(), seed))]
    fn fit(
        descriptors: &[Vec<f64>],
        rays: &[Vec<f64>],
        indices: &[usize],
        config: &BacktrackingTreeConfig,
        seed: u64,
    ) -> Result<Self, TreeError> {
        validate(descriptors, rays, indices, config)?;

        let n_dims = descriptors[indices[0]].len();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut arena: Vec<Node> = Vec::new();

        build_node(descriptors, rays, indices, config, 0, &mut rng, &mut arena);

        debug!(
            n_nodes = arena.len(),
            n_dims,
            "backtracking tree built"
        );

        Ok(Self {
            nodes: arena,
            n_dims,
        })
    }

    fn predict(&self, descriptor: &[f64], budget: usize) -> Candidate {
        backtracking_search(&self.nodes, descriptor, budget)
    }
}

fn validate(
    descriptors: &[Vec<f64>],
    rays: &[Vec<f64>],
    indices: &[usize],
    config: &BacktrackingTreeConfig,
) -> Result<(), TreeError> {
    if indices.is_empty() {
        return Err(TreeError::EmptyTrainingSet);
    }
    if descriptors.len() != rays.len() {
        return Err(TreeError::LengthMismatch {
            descriptors: descriptors.len(),
            rays: rays.len(),
        });
    }
    for &index in indices {
        if index >= descriptors.len() {
            return Err(TreeError::IndexOutOfBounds {
                index,
                len: descriptors.len(),
            });
        }
    }

    let n_dims = descriptors[indices[0]].len();
    if n_dims == 0 {
        return Err(TreeError::ZeroDescriptorDims);
    }
    let ray_dims = rays[indices[0]].len();

    for &row in indices {
        if descriptors[row].len() != n_dims {
            return Err(TreeError::DescriptorDimMismatch {
                expected: n_dims,
                got: descriptors[row].len(),
                row,
            });
        }
        if rays[row].len() != ray_dims {
            return Err(TreeError::RayDimMismatch {
                expected: ray_dims,
                got: rays[row].len(),
                row,
            });
        }
        for (column, &value) in descriptors[row].iter().enumerate() {
            if !value.is_finite() {
                return Err(TreeError::NonFiniteValue { row, column });
            }
        }
        for (column, &value) in rays[row].iter().enumerate() {
            if !value.is_finite() {
                return Err(TreeError::NonFiniteValue { row, column });
            }
        }
    }

    if let Some(depth) = config.max_depth()
        && depth == 0
    {
        return Err(TreeError::InvalidMaxDepth);
    }
    if config.min_leaf_size() == 0 {
        return Err(TreeError::InvalidMinLeafSize {
            min_leaf_size: config.min_leaf_size(),
        });
    }
    if config.candidate_dims() == 0 {
        return Err(TreeError::InvalidCandidateDims {
            candidate_dims: config.candidate_dims(),
        });
    }
    if config.candidate_thresholds() == 0 {
        return Err(TreeError::InvalidCandidateThresholds {
            candidate_thresholds: config.candidate_thresholds(),
        });
    }

    Ok(())
}

/// Per-dimension mean of the indexed rows.
fn column_mean(values: &[Vec<f64>], rows: &[usize]) -> Vec<f64> {
    let dims = values[rows[0]].len();
    let n = rows.len() as f64;
    (0..dims)
        .map(|dim| rows.iter().map(|&row| values[row][dim]).sum::<f64>() / n)
        .collect()
}

/// Recursively grow the arena, returning the new node's index.
fn build_node(
    descriptors: &[Vec<f64>],
    rays: &[Vec<f64>],
    rows: &[usize],
    config: &BacktrackingTreeConfig,
    depth: usize,
    rng: &mut ChaCha8Rng,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = rows.len();

    let depth_capped = config.max_depth().is_some_and(|max_depth| depth >= max_depth);
    if n_samples <= config.min_leaf_size() || depth_capped {
        let index = NodeIndex::new(arena.len());
        arena.push(Node::Leaf {
            ray: column_mean(rays, rows),
            centroid: column_mean(descriptors, rows),
            n_samples,
        });
        return index;
    }

    let n_dims = descriptors[rows[0]].len();
    let Some(split) = find_split(
        descriptors,
        rays,
        rows,
        n_dims,
        config.candidate_dims(),
        config.candidate_thresholds(),
        rng,
    ) else {
        let index = NodeIndex::new(arena.len());
        arena.push(Node::Leaf {
            ray: column_mean(rays, rows),
            centroid: column_mean(descriptors, rows),
            n_samples,
        });
        return index;
    };

    // Reserve the slot, recurse, then overwrite with the finished split.
    let index = NodeIndex::new(arena.len());
    arena.push(Node::Leaf {
        ray: Vec::new(),
        centroid: Vec::new(),
        n_samples,
    });

    let left = build_node(descriptors, rays, &split.left_rows, config, depth + 1, rng, arena);
    let right = build_node(descriptors, rays, &split.right_rows, config, depth + 1, rng, arena);

    arena[index.index()] = Node::Split {
        feature: split.feature,
        threshold: split.threshold,
        left,
        right,
        n_samples,
    };

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated clusters with constant rays per cluster.
    fn clustered_dataset() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let mut descriptors = Vec::new();
        let mut rays = Vec::new();
        for i in 0..20 {
            let jitter = f64::from(i % 5) * 0.01;
            if i < 10 {
                descriptors.push(vec![0.0 + jitter, 1.0 - jitter, 0.5]);
                rays.push(vec![10.0, -5.0]);
            } else {
                descriptors.push(vec![8.0 + jitter, -3.0 + jitter, 0.5]);
                rays.push(vec![-30.0, 8.0]);
            }
        }
        (descriptors, rays)
    }

    fn all_indices(n: usize) -> Vec<usize> {
        (0..n).collect()
    }

    // --- Config ---

    #[test]
    fn config_defaults() {
        let config = BacktrackingTreeConfig::new();
        assert_eq!(config.max_depth(), None);
        assert_eq!(config.min_leaf_size(), 4);
        assert_eq!(config.candidate_dims(), 8);
        assert_eq!(config.candidate_thresholds(), 10);
        assert_eq!(config, BacktrackingTreeConfig::default());
    }

    #[test]
    fn config_builder_chain() {
        let config = BacktrackingTreeConfig::new()
            .with_max_depth(Some(6))
            .with_min_leaf_size(2)
            .with_candidate_dims(4)
            .with_candidate_thresholds(20);
        assert_eq!(config.max_depth(), Some(6));
        assert_eq!(config.min_leaf_size(), 2);
        assert_eq!(config.candidate_dims(), 4);
        assert_eq!(config.candidate_thresholds(), 20);
    }

    // --- Induction ---

    #[test]
    fn separable_clusters_are_learned_exactly() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new();
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(20), &config, 42).unwrap();

        assert_eq!(tree.n_dims(), 3);
        assert!(tree.n_nodes() > 1);

        // Rays are constant within each cluster, so leaf means are exact.
        for (descriptor, ray) in descriptors.iter().zip(&rays) {
            let candidate = tree.predict(descriptor, 1);
            for (predicted, truth) in candidate.ray.iter().zip(ray) {
                assert!((predicted - truth).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn small_dataset_collapses_to_one_leaf() {
        let descriptors = vec![vec![0.0, 1.0], vec![1.0, 2.0], vec![2.0, 3.0]];
        let rays = vec![vec![9.0], vec![12.0], vec![15.0]];
        let config = BacktrackingTreeConfig::new();
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(3), &config, 1).unwrap();

        assert_eq!(tree.n_nodes(), 1);
        assert_eq!(tree.n_leaves(), 1);
        let candidate = tree.predict(&[0.5, 1.5], 4);
        assert!((candidate.ray[0] - 12.0).abs() < 1e-12);
    }

    #[test]
    fn constant_descriptors_collapse_to_one_leaf() {
        let descriptors = vec![vec![1.0, 1.0]; 12];
        let rays: Vec<Vec<f64>> = (0..12).map(|i| vec![f64::from(i)]).collect();
        let config = BacktrackingTreeConfig::new();
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(12), &config, 3).unwrap();

        assert_eq!(tree.n_leaves(), 1);
        let candidate = tree.predict(&[1.0, 1.0], 1);
        assert!((candidate.ray[0] - 5.5).abs() < 1e-12);
    }

    #[test]
    fn max_depth_one_allows_a_single_split() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_max_depth(Some(1));
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(20), &config, 42).unwrap();

        assert!(tree.n_nodes() <= 3);
        assert!(tree.n_leaves() <= 2);
    }

    #[test]
    fn duplicate_bootstrap_indices_are_accepted() {
        let (descriptors, rays) = clustered_dataset();
        let indices = vec![0, 0, 0, 11, 11, 11, 4, 15];
        let config = BacktrackingTreeConfig::new().with_min_leaf_size(2);
        let tree = BacktrackingTree::fit(&descriptors, &rays, &indices, &config, 9).unwrap();

        let candidate = tree.predict(&descriptors[0], 4);
        assert!((candidate.ray[0] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn identical_seeds_build_identical_trees() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_min_leaf_size(2);
        let indices = all_indices(20);

        let first = BacktrackingTree::fit(&descriptors, &rays, &indices, &config, 7).unwrap();
        let second = BacktrackingTree::fit(&descriptors, &rays, &indices, &config, 7).unwrap();

        assert_eq!(first.n_nodes(), second.n_nodes());
        for descriptor in &descriptors {
            assert_eq!(first.predict(descriptor, 4), second.predict(descriptor, 4));
        }
    }

    #[test]
    fn larger_budget_never_finds_a_farther_leaf() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_min_leaf_size(2);
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(20), &config, 42).unwrap();

        let query = vec![4.0, -1.0, 0.5];
        let narrow = tree.predict(&query, 1);
        let wide = tree.predict(&query, 4);
        assert!(wide.distance <= narrow.distance);
    }

    // --- Validation ---

    #[test]
    fn empty_index_set_rejected() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[], &config, 42);
        assert!(matches!(result, Err(TreeError::EmptyTrainingSet)));
    }

    #[test]
    fn length_mismatch_rejected() {
        let descriptors = vec![vec![0.0], vec![1.0]];
        let rays = vec![vec![0.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::LengthMismatch {
                descriptors: 2,
                rays: 1
            })
        ));
    }

    #[test]
    fn out_of_bounds_index_rejected() {
        let descriptors = vec![vec![0.0]];
        let rays = vec![vec![0.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 3], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::IndexOutOfBounds { index: 3, len: 1 })
        ));
    }

    #[test]
    fn ragged_descriptors_rejected() {
        let descriptors = vec![vec![0.0, 1.0], vec![2.0]];
        let rays = vec![vec![0.0], vec![1.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::DescriptorDimMismatch {
                expected: 2,
                got: 1,
                row: 1
            })
        ));
    }

    #[test]
    fn ragged_rays_rejected() {
        let descriptors = vec![vec![0.0], vec![1.0]];
        let rays = vec![vec![0.0, 1.0], vec![2.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(result, Err(TreeError::RayDimMismatch { row: 1, .. })));
    }

    #[test]
    fn non_finite_descriptor_rejected() {
        let descriptors = vec![vec![0.0], vec![f64::NAN]];
        let rays = vec![vec![0.0], vec![1.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::NonFiniteValue { row: 1, column: 0 })
        ));
    }

    #[test]
    fn non_finite_ray_rejected() {
        let descriptors = vec![vec![0.0], vec![1.0]];
        let rays = vec![vec![0.0], vec![f64::INFINITY]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::NonFiniteValue { row: 1, column: 0 })
        ));
    }

    #[test]
    fn zero_dimension_descriptors_rejected() {
        let descriptors = vec![Vec::new(), Vec::new()];
        let rays = vec![vec![0.0], vec![1.0]];
        let config = BacktrackingTreeConfig::new();
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(result, Err(TreeError::ZeroDescriptorDims)));
    }

    #[test]
    fn zero_max_depth_rejected() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_max_depth(Some(0));
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(result, Err(TreeError::InvalidMaxDepth)));
    }

    #[test]
    fn zero_min_leaf_size_rejected() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_min_leaf_size(0);
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::InvalidMinLeafSize { min_leaf_size: 0 })
        ));
    }

    #[test]
    fn zero_candidate_dims_rejected() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_candidate_dims(0);
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::InvalidCandidateDims { candidate_dims: 0 })
        ));
    }

    #[test]
    fn zero_candidate_thresholds_rejected() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new().with_candidate_thresholds(0);
        let result = BacktrackingTree::fit(&descriptors, &rays, &[0, 1], &config, 42);
        assert!(matches!(
            result,
            Err(TreeError::InvalidCandidateThresholds {
                candidate_thresholds: 0
            })
        ));
    }

    // --- Serialization ---

    #[test]
    fn serde_round_trip_preserves_predictions() {
        let (descriptors, rays) = clustered_dataset();
        let config = BacktrackingTreeConfig::new();
        let tree =
            BacktrackingTree::fit(&descriptors, &rays, &all_indices(20), &config, 42).unwrap();

        let json = serde_json::to_string(&tree).unwrap();
        let restored: BacktrackingTree = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.n_nodes(), tree.n_nodes());
        for descriptor in descriptors.iter().take(5) {
            assert_eq!(
                restored.predict(descriptor, 4),
                tree.predict(descriptor, 4)
            );
        }
    }
}
