//! The single-tree interface consumed by the ensemble trainer.

/// One prediction produced by a budgeted tree search.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Predicted pan/tilt ray in degrees.
    pub ray: Vec<f64>,
    /// Euclidean distance between the query descriptor and the centroid
    /// of the leaf the prediction came from.
    pub distance: f64,
}

/// A regression tree that can join the ensemble.
///
/// Members map a keypoint descriptor to a pan/tilt ray via a budgeted
/// best-first search. `fit` must be deterministic for identical inputs
/// and seed; all randomness comes from the explicit `seed` argument.
pub trait Tree: Sized + Send + Sync {
    /// Induction parameters shared by every member of one ensemble.
    type Config: Clone + std::fmt::Debug + Send + Sync;

    /// Induction failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Build a tree over the rows of `descriptors`/`rays` selected by
    /// `indices`.
    ///
    /// The same row may appear more than once (bootstrap draws) and row
    /// order carries no meaning.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the trainer wraps failures as
    /// [`ForestError::TreeInduction`](crate::ForestError::TreeInduction).
    fn fit(
        descriptors: &[Vec<f64>],
        rays: &[Vec<f64>],
        indices: &[usize],
        config: &Self::Config,
        seed: u64,
    ) -> Result<Self, Self::Error>;

    /// Return the best candidate found within `budget` leaf evaluations.
    ///
    /// `descriptor` must have the dimensionality the tree was trained on;
    /// the ensemble checks this before fanning out. A budget of zero
    /// behaves as one.
    fn predict(&self, descriptor: &[f64], budget: usize) -> Candidate;
}
