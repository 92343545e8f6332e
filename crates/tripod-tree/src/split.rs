//! Randomized split search for tree induction.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::node::FeatureIndex;

/// A split chosen for an interior node, with its row partition.
#[derive(Debug, Clone)]
pub(crate) struct SplitChoice {
    pub(crate) feature: FeatureIndex,
    pub(crate) threshold: f64,
    pub(crate) left_rows: Vec<usize>,
    pub(crate) right_rows: Vec<usize>,
}

/// Total squared deviation of the indexed rays from their per-dimension mean.
pub(crate) fn ray_spread(rays: &[Vec<f64>], rows: &[usize]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let dims = rays[rows[0]].len();
    let n = rows.len() as f64;
    let mut spread = 0.0;
    for dim in 0..dims {
        let mean = rows.iter().map(|&row| rays[row][dim]).sum::<f64>() / n;
        spread += rows
            .iter()
            .map(|&row| {
                let delta = rays[row][dim] - mean;
                delta * delta
            })
            .sum::<f64>();
    }
    spread
}

/// Find the lowest-spread randomized split for the given rows.
///
/// Draws `candidate_dims` random descriptor dimensions; for each, draws
/// `candidate_thresholds` random thresholds within the observed value
/// range and scores the partition by the summed ray spread of the two
/// children. Returns `None` when no candidate yields two non-empty
/// children, which happens when every sampled dimension is constant
/// across the rows.
pub(crate) fn find_split(
    descriptors: &[Vec<f64>],
    rays: &[Vec<f64>],
    rows: &[usize],
    n_dims: usize,
    candidate_dims: usize,
    candidate_thresholds: usize,
    rng: &mut ChaCha8Rng,
) -> Option<SplitChoice> {
    let mut best: Option<(f64, SplitChoice)> = None;

    for _ in 0..candidate_dims {
        let dim = rng.gen_range(0..n_dims);

        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &row in rows {
            let value = descriptors[row][dim];
            lo = lo.min(value);
            hi = hi.max(value);
        }
        // A constant dimension cannot separate anything.
        if hi <= lo {
            continue;
        }

        for _ in 0..candidate_thresholds {
            let threshold = rng.gen_range(lo..hi);

            let mut left_rows = Vec::new();
            let mut right_rows = Vec::new();
            for &row in rows {
                if descriptors[row][dim] <= threshold {
                    left_rows.push(row);
                } else {
                    right_rows.push(row);
                }
            }
            if left_rows.is_empty() || right_rows.is_empty() {
                continue;
            }

            let score = ray_spread(rays, &left_rows) + ray_spread(rays, &right_rows);
            let better = best.as_ref().is_none_or(|(best_score, _)| score < *best_score);
            if better {
                best = Some((
                    score,
                    SplitChoice {
                        feature: FeatureIndex::new(dim),
                        threshold,
                        left_rows,
                        right_rows,
                    },
                ));
            }
        }
    }

    best.map(|(_, choice)| choice)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    // --- Spread ---

    #[test]
    fn spread_of_identical_rays_is_zero() {
        let rays = vec![vec![10.0, -5.0]; 4];
        let rows = vec![0, 1, 2, 3];
        assert_eq!(ray_spread(&rays, &rows), 0.0);
    }

    #[test]
    fn spread_sums_over_dimensions() {
        // Dim 0 deviations: -1, 1 -> 2. Dim 1 deviations: -2, 2 -> 8.
        let rays = vec![vec![9.0, -7.0], vec![11.0, -3.0]];
        let rows = vec![0, 1];
        let spread = ray_spread(&rays, &rows);
        assert!((spread - 10.0).abs() < 1e-12);
    }

    #[test]
    fn spread_of_empty_row_set_is_zero() {
        let rays = vec![vec![1.0]];
        assert_eq!(ray_spread(&rays, &[]), 0.0);
    }

    // --- Split search ---

    #[test]
    fn separable_clusters_are_split_apart() {
        // Two ray clusters separated on descriptor dim 0.
        let mut descriptors = Vec::new();
        let mut rays = Vec::new();
        for i in 0..8 {
            let (x, ray) = if i < 4 {
                (0.0 + f64::from(i) * 0.01, vec![10.0, -5.0])
            } else {
                (5.0 + f64::from(i) * 0.01, vec![-20.0, 3.0])
            };
            descriptors.push(vec![x]);
            rays.push(ray);
        }
        let rows: Vec<usize> = (0..8).collect();

        let choice = find_split(&descriptors, &rays, &rows, 1, 4, 16, &mut rng()).unwrap();

        let mut left = choice.left_rows.clone();
        let mut right = choice.right_rows.clone();
        left.sort_unstable();
        right.sort_unstable();
        assert_eq!(left, vec![0, 1, 2, 3]);
        assert_eq!(right, vec![4, 5, 6, 7]);
        assert_eq!(choice.feature.index(), 0);
    }

    #[test]
    fn partition_is_exact_and_disjoint() {
        let descriptors: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i), 0.5]).collect();
        let rays: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i) * 2.0]).collect();
        let rows: Vec<usize> = (0..10).collect();

        let choice = find_split(&descriptors, &rays, &rows, 2, 8, 8, &mut rng()).unwrap();

        let mut all: Vec<usize> = choice
            .left_rows
            .iter()
            .chain(&choice.right_rows)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, rows);
        for &row in &choice.left_rows {
            assert!(descriptors[row][choice.feature.index()] <= choice.threshold);
        }
        for &row in &choice.right_rows {
            assert!(descriptors[row][choice.feature.index()] > choice.threshold);
        }
    }

    #[test]
    fn constant_descriptors_yield_no_split() {
        let descriptors = vec![vec![1.0, 1.0]; 6];
        let rays: Vec<Vec<f64>> = (0..6).map(|i| vec![f64::from(i)]).collect();
        let rows: Vec<usize> = (0..6).collect();

        let choice = find_split(&descriptors, &rays, &rows, 2, 8, 8, &mut rng());
        assert!(choice.is_none());
    }
}
