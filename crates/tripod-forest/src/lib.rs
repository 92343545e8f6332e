//! Pan/tilt regression forest training for PTZ camera relocalization.
//!
//! Trains a bagged ensemble of regression trees that map keypoint
//! descriptors to pan/tilt rays: each member draws a bootstrap sample of
//! frames, extracts their keypoints, and fits one tree. The crate also
//! provides per-member quartile diagnostics, holdout validation,
//! out-of-bag reselection of hard examples, and versioned model
//! persistence. Tree induction and sample extraction plug in through the
//! [`Tree`] and [`SampleSource`] traits.

mod config;
mod error;
mod model;
mod oob;
mod result;
mod sample;
mod serialize;
mod summary;
mod trainer;
mod tree;
mod validate;

pub use config::ForestConfig;
pub use error::ForestError;
pub use model::RayForest;
pub use oob::OobSelector;
pub use result::{MemberSummary, TrainingMetadata, TrainingResult};
pub use sample::{FrameId, SampleSource, TrainingSample};
pub use summary::ErrorSummary;
pub use tree::{Candidate, Tree};
pub use validate::{HoldoutValidation, RoundSummary, ValidationResult};
