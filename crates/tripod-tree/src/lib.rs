//! Backtracking regression trees for descriptor-to-ray mapping.
//!
//! Grows randomized regression trees whose leaves hold mean pan/tilt rays
//! and descriptor centroids, and answers queries with a budgeted
//! best-first search that re-descends the most marginal untaken branches.
//! Implements the [`Tree`](tripod_forest::Tree) interface so trees can
//! join a [`RayForest`](tripod_forest::RayForest) ensemble.

mod error;
mod node;
mod search;
mod split;
mod tree;

pub use error::TreeError;
pub use node::{FeatureIndex, Node, NodeIndex};
pub use tree::{BacktrackingTree, BacktrackingTreeConfig};
