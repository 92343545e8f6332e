//! Domain types for frame I/O.

use crate::error::IoError;

/// A validated run name used for output file naming.
///
/// Must be non-empty and match `[a-zA-Z0-9_-]+` so it stays safe inside
/// file names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunName(String);

impl RunName {
    /// Parse and validate a run name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidRunName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IoError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(IoError::InvalidRunName { name });
        }
        Ok(Self(name))
    }

    /// Return the run name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RunName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A PTZ camera pose: pan and tilt in degrees, focal length in pixels.
///
/// Every row of a frame CSV repeats the frame's pose verbatim, so exact
/// float equality is the intended comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Pan angle in degrees.
    pub pan: f64,
    /// Tilt angle in degrees.
    pub tilt: f64,
    /// Focal length in pixels.
    pub focal_length: f64,
}

impl CameraPose {
    /// Create a pose.
    #[must_use]
    pub fn new(pan: f64, tilt: f64, focal_length: f64) -> Self {
        Self {
            pan,
            tilt,
            focal_length,
        }
    }
}
