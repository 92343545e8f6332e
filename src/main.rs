use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use tripod_forest::{
    ForestConfig, HoldoutValidation, OobSelector, RayForest, SampleSource, TrainingResult,
};
use tripod_io::{FrameStore, ReportWriter, RunName};
use tripod_tree::{BacktrackingTree, BacktrackingTreeConfig};

#[derive(Parser)]
#[command(name = "tripod")]
#[command(about = "PTZ camera relocalization with bagged regression tree ensembles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Tuning parameters for regression tree induction.
#[derive(Args, Debug, Clone)]
struct TreeArgs {
    /// Maximum tree depth (unlimited if not set)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Stop splitting once a node holds this many samples or fewer
    #[arg(long, default_value_t = 4)]
    min_leaf_size: usize,

    /// Candidate feature dimensions examined per split
    #[arg(long, default_value_t = 8)]
    candidate_dims: usize,

    /// Candidate thresholds drawn per examined dimension
    #[arg(long, default_value_t = 10)]
    candidate_thresholds: usize,
}

/// Camera intrinsics shared by every command.
#[derive(Args, Debug, Clone)]
struct CameraArgs {
    /// Principal point x coordinate in pixels
    #[arg(long, default_value_t = 0.0)]
    pp_x: f64,

    /// Principal point y coordinate in pixels
    #[arg(long, default_value_t = 0.0)]
    pp_y: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Train a ray forest on a directory of keypoint frames
    Train {
        /// Path to the frame directory (one CSV per frame)
        #[arg(long)]
        frames: PathBuf,

        /// Number of ensemble members
        #[arg(long, default_value_t = 8)]
        trees: usize,

        /// Frames drawn (with replacement) per member
        #[arg(long, default_value_t = 32)]
        frames_per_tree: usize,

        /// Run name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        run: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        camera: CameraArgs,

        #[command(flatten)]
        tree: TreeArgs,
    },

    /// Replay held-out frames against a trained model
    Validate {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the frame directory (one CSV per frame)
        #[arg(long)]
        frames: PathBuf,

        /// Number of validation rounds (one frame drawn per round)
        #[arg(long, default_value_t = 10)]
        rounds: usize,

        /// Run name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        run: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        camera: CameraArgs,
    },

    /// Keep the samples a trained model cannot already explain
    Select {
        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Path to the frame directory (one CSV per frame)
        #[arg(long)]
        frames: PathBuf,

        /// A sample is explained only if its nearest candidate is closer than this
        #[arg(long, default_value_t = 0.5)]
        distance_threshold: f64,

        /// A sample is explained only if its ray error is below this (degrees)
        #[arg(long, default_value_t = 1.0)]
        error_threshold: f64,

        /// Run name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        run: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        camera: CameraArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    run: String,
    n_frames: usize,
    n_trees: usize,
    feature_dim: usize,
    ray_dim: usize,
    model_path: String,
}

#[derive(Serialize)]
struct ValidateOutput {
    run: String,
    n_rounds: usize,
    rounds: Vec<RoundOutput>,
}

#[derive(Serialize)]
struct RoundOutput {
    frame: String,
    n_samples: usize,
    median_error: Vec<f64>,
    median_distance: f64,
}

#[derive(Serialize)]
struct SelectOutput {
    run: String,
    pool: usize,
    n_selected: usize,
    ratio: f64,
}

fn build_tree_config(args: &TreeArgs) -> BacktrackingTreeConfig {
    BacktrackingTreeConfig::new()
        .with_max_depth(args.max_depth)
        .with_min_leaf_size(args.min_leaf_size)
        .with_candidate_dims(args.candidate_dims)
        .with_candidate_thresholds(args.candidate_thresholds)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            frames,
            trees,
            frames_per_tree,
            run,
            output_dir,
            camera,
            tree,
        } => {
            let run_name = RunName::new(run.clone())?;

            // Enumerate the frame pool
            let store = FrameStore::new(&frames);
            let frame_ids = store
                .frames()
                .context("failed to enumerate frame directory")?;
            info!(n_frames = frame_ids.len(), "frame pool loaded");

            // Build the forest configuration
            let config = ForestConfig::new(trees, build_tree_config(&tree))?
                .with_frames_per_tree(frames_per_tree)
                .with_principal_point([camera.pp_x, camera.pp_y])
                .with_seed(cli.seed);

            // Train, checkpointing the ensemble after every member. The
            // checkpoint after the last member is the final model.
            let writer = ReportWriter::new(&output_dir, run_name)?;
            let model_path = writer.model_path();
            let result: TrainingResult<BacktrackingTree> = config
                .train(&store, &frame_ids, Some(model_path.as_path()))
                .context("training failed")?;
            info!(path = %model_path.display(), "model saved");

            // Write training report JSON
            writer.write_training(result.metadata(), result.members())?;

            // Print summary
            let output = TrainOutput {
                run,
                n_frames: frame_ids.len(),
                n_trees: result.metadata().n_trees,
                feature_dim: result.metadata().feature_dim,
                ray_dim: result.metadata().ray_dim,
                model_path: model_path.display().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Validate {
            model,
            frames,
            rounds,
            run,
            output_dir,
            camera,
        } => {
            let run_name = RunName::new(run.clone())?;

            // Load the trained model
            let forest = RayForest::<BacktrackingTree>::load(&model)
                .context("failed to load model")?;
            info!(n_trees = forest.n_trees(), "model loaded");

            // Enumerate the frame pool
            let store = FrameStore::new(&frames);
            let frame_ids = store
                .frames()
                .context("failed to enumerate frame directory")?;
            info!(n_frames = frame_ids.len(), "frame pool loaded");

            // Replay rounds against the model
            let validation = HoldoutValidation::new(rounds)?
                .with_principal_point([camera.pp_x, camera.pp_y])
                .with_seed(cli.seed);
            let report = validation
                .evaluate(&forest, &store, &frame_ids)
                .context("validation failed")?;

            // Write validation report JSON
            let writer = ReportWriter::new(&output_dir, run_name)?;
            writer.write_validation(&report)?;

            // Print summary
            let output = ValidateOutput {
                run,
                n_rounds: report.rounds.len(),
                rounds: report
                    .rounds
                    .iter()
                    .map(|round| RoundOutput {
                        frame: round.frame.as_str().to_string(),
                        n_samples: round.n_samples,
                        median_error: round.error.median().to_vec(),
                        median_distance: round.median_distance,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Select {
            model,
            frames,
            distance_threshold,
            error_threshold,
            run,
            output_dir,
            camera,
        } => {
            let run_name = RunName::new(run.clone())?;

            // Load the trained model
            let forest = RayForest::<BacktrackingTree>::load(&model)
                .context("failed to load model")?;
            info!(n_trees = forest.n_trees(), "model loaded");

            // Flatten every frame into one candidate pool
            let store = FrameStore::new(&frames);
            let frame_ids = store
                .frames()
                .context("failed to enumerate frame directory")?;
            let principal_point = [camera.pp_x, camera.pp_y];
            let mut descriptors = Vec::new();
            let mut rays = Vec::new();
            for frame in &frame_ids {
                let samples = store
                    .generate(frame, principal_point)
                    .with_context(|| format!("failed to read frame {frame}"))?;
                for sample in samples {
                    descriptors.push(sample.descriptor);
                    rays.push(sample.ray);
                }
            }
            info!(
                n_frames = frame_ids.len(),
                pool = descriptors.len(),
                "candidate pool flattened"
            );

            // Keep what the model cannot explain
            let selector = OobSelector::new(distance_threshold, error_threshold);
            let kept = selector
                .select(&forest, &descriptors, &rays)
                .context("selection failed")?;

            // Write selection report JSON
            let writer = ReportWriter::new(&output_dir, run_name)?;
            writer.write_selection(&kept, descriptors.len())?;

            // Print summary
            let ratio = if descriptors.is_empty() {
                0.0
            } else {
                kept.len() as f64 / descriptors.len() as f64
            };
            let output = SelectOutput {
                run,
                pool: descriptors.len(),
                n_selected: kept.len(),
                ratio,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
