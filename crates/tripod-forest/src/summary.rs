//! Per-dimension quartile summaries of absolute prediction errors.

use serde::{Deserialize, Serialize};

use crate::error::ForestError;

/// Quartiles of absolute error, one entry per output dimension.
///
/// Quartiles use the sorted-index convention: for a column of `n` sorted
/// values the first quartile is element `n / 4`, the median element
/// `n / 2`, and the third quartile element `3 * n / 4` (integer division,
/// no interpolation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    first_quartile: Vec<f64>,
    median: Vec<f64>,
    third_quartile: Vec<f64>,
}

impl ErrorSummary {
    /// Summarize a batch of per-sample absolute error rows.
    ///
    /// `errors[sample][dim]`; every row must have the same length.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::EmptyErrorBatch`] | `errors` has zero rows |
    /// | [`ForestError::RaggedErrorBatch`] | rows disagree on dimension count |
    pub fn from_errors(errors: &[Vec<f64>]) -> Result<Self, ForestError> {
        if errors.is_empty() {
            return Err(ForestError::EmptyErrorBatch);
        }

        let dims = errors[0].len();
        for (index, row) in errors.iter().enumerate() {
            if row.len() != dims {
                return Err(ForestError::RaggedErrorBatch {
                    expected: dims,
                    got: row.len(),
                    index,
                });
            }
        }

        let n = errors.len();
        let mut first_quartile = Vec::with_capacity(dims);
        let mut median = Vec::with_capacity(dims);
        let mut third_quartile = Vec::with_capacity(dims);
        let mut column = Vec::with_capacity(n);
        for dim in 0..dims {
            column.clear();
            column.extend(errors.iter().map(|row| row[dim]));
            column.sort_by(|a, b| a.total_cmp(b));
            first_quartile.push(column[n / 4]);
            median.push(column[n / 2]);
            third_quartile.push(column[3 * n / 4]);
        }

        Ok(Self {
            first_quartile,
            median,
            third_quartile,
        })
    }

    /// Return the per-dimension first quartiles.
    #[must_use]
    pub fn first_quartile(&self) -> &[f64] {
        &self.first_quartile
    }

    /// Return the per-dimension medians.
    #[must_use]
    pub fn median(&self) -> &[f64] {
        &self.median
    }

    /// Return the per-dimension third quartiles.
    #[must_use]
    pub fn third_quartile(&self) -> &[f64] {
        &self.third_quartile
    }

    /// Return the number of output dimensions summarized.
    #[must_use]
    pub fn dims(&self) -> usize {
        self.median.len()
    }
}
