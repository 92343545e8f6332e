//! Out-of-bag reselection: keep the examples the model explains poorly.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::error::ForestError;
use crate::model::RayForest;
use crate::tree::Tree;

/// Per-example search budget used for selection queries.
const SEARCH_BUDGET: usize = 4;

/// Selects hard examples from a held-out sample pool.
///
/// An example counts as explained when the model's top candidate is both
/// close in descriptor space (`distance < feature_distance_threshold`)
/// and accurate (`error < error_threshold`, Euclidean over ray
/// dimensions). Explained examples are dropped; everything else is kept
/// for reinforcement training.
#[derive(Debug, Clone)]
pub struct OobSelector {
    feature_distance_threshold: f64,
    error_threshold: f64,
}

impl OobSelector {
    /// Create a selector with the given thresholds.
    #[must_use]
    pub fn new(feature_distance_threshold: f64, error_threshold: f64) -> Self {
        Self {
            feature_distance_threshold,
            error_threshold,
        }
    }

    /// Return the descriptor-distance threshold.
    #[must_use]
    pub fn feature_distance_threshold(&self) -> f64 {
        self.feature_distance_threshold
    }

    /// Return the prediction-error threshold.
    #[must_use]
    pub fn error_threshold(&self) -> f64 {
        self.error_threshold
    }

    /// Scan the pool and return the indices to keep, in input order.
    ///
    /// Each example queries the ensemble with a search budget of 4 and
    /// judges the top returned candidate. Both thresholds are strict:
    /// an example sitting exactly on either threshold is kept. An empty
    /// pool yields an empty selection.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::LengthMismatch`] | descriptor and ray counts differ |
    /// | [`ForestError::UntrainedModel`] | the model has no members |
    /// | [`ForestError::FeatureDimMismatch`] | a descriptor disagrees with the model |
    #[instrument(skip_all, fields(pool = descriptors.len()))]
    pub fn select<T: Tree>(
        &self,
        model: &RayForest<T>,
        descriptors: &[Vec<f64>],
        rays: &[Vec<f64>],
    ) -> Result<Vec<usize>, ForestError> {
        if descriptors.len() != rays.len() {
            return Err(ForestError::LengthMismatch {
                descriptors: descriptors.len(),
                rays: rays.len(),
            });
        }
        if descriptors.is_empty() {
            return Ok(Vec::new());
        }

        let keep: Vec<bool> = (0..descriptors.len())
            .into_par_iter()
            .map(|i| {
                let candidates = model.predict(&descriptors[i], SEARCH_BUDGET)?;
                let top = candidates.first().ok_or(ForestError::UntrainedModel)?;
                let error = top
                    .ray
                    .iter()
                    .zip(&rays[i])
                    .map(|(predicted, truth)| (predicted - truth) * (predicted - truth))
                    .sum::<f64>()
                    .sqrt();
                let explained = top.distance < self.feature_distance_threshold
                    && error < self.error_threshold;
                Ok(!explained)
            })
            .collect::<Result<_, ForestError>>()?;

        let selected: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &kept)| kept.then_some(i))
            .collect();

        info!(
            pool = descriptors.len(),
            selected = selected.len(),
            ratio = selected.len() as f64 / descriptors.len() as f64,
            "out-of-bag selection complete"
        );

        Ok(selected)
    }
}
