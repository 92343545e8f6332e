//! Bootstrap training loop for the pan/tilt ensemble.

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::config::ForestConfig;
use crate::error::ForestError;
use crate::model::{Dims, RayForest};
use crate::result::{MemberSummary, TrainingMetadata, TrainingResult};
use crate::sample::{FrameId, SampleSource, TrainingSample};
use crate::summary::ErrorSummary;
use crate::tree::Tree;

/// Draw `draw_count` frame indices uniformly with replacement.
///
/// Returns the draws plus the number of distinct frames among them.
fn bootstrap_frames(
    pool_size: usize,
    draw_count: usize,
    rng: &mut ChaCha8Rng,
) -> (Vec<usize>, usize) {
    let draws: Vec<usize> = (0..draw_count).map(|_| rng.gen_range(0..pool_size)).collect();

    let mut seen = vec![false; pool_size];
    for &draw in &draws {
        seen[draw] = true;
    }
    let distinct = seen.iter().filter(|&&hit| hit).count();

    (draws, distinct)
}

/// Extract every sample from the drawn frames, in draw order.
fn collect_member_batch<S: SampleSource>(
    source: &S,
    frames: &[FrameId],
    draws: &[usize],
    principal_point: [f64; 2],
) -> Result<Vec<TrainingSample>, ForestError> {
    let mut batch = Vec::new();
    for &frame_index in draws {
        let frame = &frames[frame_index];
        let samples =
            source
                .generate(frame, principal_point)
                .map_err(|e| ForestError::SampleGeneration {
                    frame: frame.as_str().to_string(),
                    source: Box::new(e),
                })?;
        batch.extend(samples);
    }
    Ok(batch)
}

/// Train the ensemble described by `config` over the given frame pool.
///
/// Members train sequentially so checkpoints always hold a prefix of the
/// final ensemble; only the read-only diagnostic predictions fan out in
/// parallel.
#[instrument(skip_all, fields(n_trees = config.n_trees, pool = frames.len()))]
pub(crate) fn train<S, T>(
    config: &ForestConfig<T::Config>,
    source: &S,
    frames: &[FrameId],
    checkpoint: Option<&Path>,
) -> Result<TrainingResult<T>, ForestError>
where
    S: SampleSource,
    T: Tree + Serialize + Clone,
    T::Config: Serialize,
{
    if frames.is_empty() {
        return Err(ForestError::EmptyFramePool);
    }
    if config.frames_per_tree == 0 {
        return Err(ForestError::InvalidFrameSampleCount {
            frames_per_tree: config.frames_per_tree,
        });
    }

    // A member cannot usefully draw more than the whole pool.
    let draw_count = config.frames_per_tree.min(frames.len());

    info!(
        n_trees = config.n_trees,
        pool = frames.len(),
        draw_count,
        seed = config.seed,
        "training ray forest"
    );

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut model = RayForest {
        trees: Vec::with_capacity(config.n_trees),
        dims: None,
        tree_config: config.tree.clone(),
    };
    let mut members = Vec::with_capacity(config.n_trees);

    for member in 0..config.n_trees {
        let tree_seed: u64 = master_rng.r#gen();
        let (draws, n_distinct_frames) = bootstrap_frames(frames.len(), draw_count, &mut master_rng);

        let batch = collect_member_batch(source, frames, &draws, config.principal_point)?;
        if batch.is_empty() {
            return Err(ForestError::EmptyMemberBatch {
                member,
                n_frames: draw_count,
            });
        }

        let descriptors: Vec<Vec<f64>> = batch.iter().map(|s| s.descriptor.clone()).collect();
        let rays: Vec<Vec<f64>> = batch.iter().map(|s| s.ray.clone()).collect();

        // Dimensionality is fixed once, by the first member's first sample.
        if model.dims.is_none() {
            model.dims = Some(Dims {
                feature: descriptors[0].len(),
                ray: rays[0].len(),
            });
        }

        let indices: Vec<usize> = (0..batch.len()).collect();
        let tree = T::fit(&descriptors, &rays, &indices, &config.tree, tree_seed).map_err(|e| {
            ForestError::TreeInduction {
                member,
                source: Box::new(e),
            }
        })?;

        // Budget-1 diagnostics on the member's own training batch.
        let errors: Vec<Vec<f64>> = (0..batch.len())
            .into_par_iter()
            .map(|i| {
                let candidate = tree.predict(&descriptors[i], 1);
                candidate
                    .ray
                    .iter()
                    .zip(&rays[i])
                    .map(|(predicted, truth)| (predicted - truth).abs())
                    .collect()
            })
            .collect();
        let training_error = ErrorSummary::from_errors(&errors)?;

        debug!(
            member,
            n_samples = batch.len(),
            n_distinct_frames,
            median = ?training_error.median(),
            "member training error quartiles"
        );

        model.trees.push(tree);
        members.push(MemberSummary {
            member,
            n_distinct_frames,
            n_samples: batch.len(),
            training_error,
        });

        if let Some(path) = checkpoint {
            model.save(path)?;
            debug!(member, path = %path.display(), "checkpoint saved");
        }

        info!(member, n_samples = batch.len(), "ensemble member trained");
    }

    // The loop ran at least once and every member batch was non-empty.
    let dims = model.dims.expect("dims fixed during training");

    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        feature_dim: dims.feature,
        ray_dim: dims.ray,
        n_frames_pool: frames.len(),
        frames_per_tree: draw_count,
        seed: config.seed,
    };

    info!(
        n_trees = model.n_trees(),
        feature_dim = dims.feature,
        ray_dim = dims.ray,
        "ray forest training complete"
    );

    Ok(TrainingResult::new(model, members, metadata))
}
