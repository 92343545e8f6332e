//! File I/O, back-projection, and report serialization for the tripod pipeline.

mod domain;
mod error;
mod frames;
mod projection;
mod writer;

pub use domain::{CameraPose, RunName};
pub use error::IoError;
pub use frames::FrameStore;
pub use projection::{pixel_to_ray, ray_to_pixel};
pub use writer::ReportWriter;
