//! Best-first backtracking search over a fitted tree arena.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use tripod_forest::Candidate;

use crate::node::{Node, NodeIndex};

/// A branch not taken during descent, keyed by how close the query came
/// to the split threshold. Smaller margins are more promising.
#[derive(Debug, Clone, Copy)]
struct Pending {
    margin: f64,
    node: NodeIndex,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.margin
            .total_cmp(&other.margin)
            .then_with(|| self.node.cmp(&other.node))
    }
}

/// Walk from `start` down to a leaf, pushing every untaken branch.
fn descend(
    nodes: &[Node],
    descriptor: &[f64],
    start: NodeIndex,
    pending: &mut BinaryHeap<Reverse<Pending>>,
) -> usize {
    let mut current = start.index();
    loop {
        match &nodes[current] {
            Node::Leaf { .. } => return current,
            Node::Split {
                feature,
                threshold,
                left,
                right,
                ..
            } => {
                let value = descriptor[feature.index()];
                let margin = (value - threshold).abs();
                let (taken, untaken) = if value <= *threshold {
                    (left, right)
                } else {
                    (right, left)
                };
                pending.push(Reverse(Pending {
                    margin,
                    node: *untaken,
                }));
                current = taken.index();
            }
        }
    }
}

/// Euclidean distance between the query and a leaf centroid.
fn centroid_distance(descriptor: &[f64], centroid: &[f64]) -> f64 {
    descriptor
        .iter()
        .zip(centroid)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}

/// Run the budgeted best-first search and return the closest leaf found.
///
/// The first descent always completes; afterwards the pending branch
/// with the smallest threshold margin re-descends, until `budget` leaves
/// have been evaluated. A budget of zero behaves as one.
pub(crate) fn backtracking_search(nodes: &[Node], descriptor: &[f64], budget: usize) -> Candidate {
    let budget = budget.max(1);
    let mut pending: BinaryHeap<Reverse<Pending>> = BinaryHeap::new();

    let mut best: Option<(f64, usize)> = None;
    let mut visited = 0;
    let mut next = Some(NodeIndex::new(0));

    while let Some(start) = next {
        let leaf = descend(nodes, descriptor, start, &mut pending);
        if let Node::Leaf { centroid, .. } = &nodes[leaf] {
            let distance = centroid_distance(descriptor, centroid);
            let closer = best.is_none_or(|(best_distance, _)| distance < best_distance);
            if closer {
                best = Some((distance, leaf));
            }
        }
        visited += 1;
        next = if visited < budget {
            pending.pop().map(|Reverse(p)| p.node)
        } else {
            None
        };
    }

    let (distance, leaf) = best.expect("search visits at least one leaf");
    match &nodes[leaf] {
        Node::Leaf { ray, .. } => Candidate {
            ray: ray.clone(),
            distance,
        },
        Node::Split { .. } => unreachable!("descend always ends at a leaf"),
    }
}
