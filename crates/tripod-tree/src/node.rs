//! Arena node types for backtracking regression trees.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Zero-based descriptor column index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureIndex(usize);

impl FeatureIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the underlying column index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for FeatureIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.0)
    }
}

/// Index into the tree's `Vec<Node>` arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the underlying arena index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A node in the tree arena.
///
/// Trees are stored as a flat `Vec<Node>` with children referenced by
/// [`NodeIndex`], which keeps them cheap to serialize and walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    /// An interior split node.
    Split {
        /// Descriptor dimension tested by this split.
        feature: FeatureIndex,
        /// Split threshold: rows with `descriptor[feature] <= threshold`
        /// go left.
        threshold: f64,
        /// Arena index of the left child.
        left: NodeIndex,
        /// Arena index of the right child.
        right: NodeIndex,
        /// Number of training rows that reached this node.
        n_samples: usize,
    },
    /// A terminal leaf node.
    Leaf {
        /// Mean pan/tilt ray of the leaf's training rows, in degrees.
        ray: Vec<f64>,
        /// Mean descriptor of the leaf's training rows; query distances
        /// are measured against it.
        centroid: Vec<f64>,
        /// Number of training rows in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training rows that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
