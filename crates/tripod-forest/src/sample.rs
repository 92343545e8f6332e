//! Sample vocabulary: frame identifiers, keypoint samples, and the
//! extraction interface the trainer draws from.

use serde::{Deserialize, Serialize};

/// Opaque identifier for one training frame, typically a file name inside
/// the frame directory.
///
/// Ordering is lexicographic so frame pools enumerate stably across runs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FrameId(String);

impl FrameId {
    /// Create a new frame identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One keypoint extracted from a frame: an appearance descriptor plus the
/// pan/tilt ray it back-projects to, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSample {
    /// Appearance descriptor of the keypoint.
    pub descriptor: Vec<f64>,
    /// Pan/tilt ray of the keypoint in degrees.
    pub ray: Vec<f64>,
}

impl TrainingSample {
    /// Create a sample from a descriptor and its ray.
    #[must_use]
    pub fn new(descriptor: Vec<f64>, ray: Vec<f64>) -> Self {
        Self { descriptor, ray }
    }
}

/// Produces keypoint samples for a frame on demand.
///
/// Implementations own file access and feature extraction; the trainer
/// only decides which frames to draw. A frame may legitimately yield zero
/// samples.
pub trait SampleSource {
    /// Extraction failure type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Extract every keypoint sample for `frame`.
    ///
    /// `principal_point` is the image center used for ray back-projection.
    /// All samples of one frame must share descriptor and ray
    /// dimensionality with the rest of the pool.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the trainer wraps failures as
    /// [`ForestError::SampleGeneration`](crate::ForestError::SampleGeneration).
    fn generate(
        &self,
        frame: &FrameId,
        principal_point: [f64; 2],
    ) -> Result<Vec<TrainingSample>, Self::Error>;
}
