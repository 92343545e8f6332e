//! I/O error types for tripod-io.

use std::path::PathBuf;

/// Errors from frame reading, validation, and report writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when a frame file does not exist or cannot be opened.
    #[error("file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the frame directory cannot be enumerated.
    #[error("cannot read frame directory {path}")]
    DirRead {
        /// The unreadable directory.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// The offending file.
        path: PathBuf,
        /// Byte offset of the failure, when known.
        offset: u64,
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the header has too few columns for a pose, a pixel,
    /// and at least one descriptor dimension.
    #[error("frame {path} has {n_columns} columns, need at least {min} (pan,tilt,focal_length,u,v,d0..)")]
    MissingDescriptorColumns {
        /// The offending file.
        path: PathBuf,
        /// Number of header columns found.
        n_columns: usize,
        /// Minimum column count required.
        min: usize,
    },

    /// Returned when a data row has a different column count than the header.
    #[error("inconsistent row length in {path}: row {row_index} has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// The offending file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// Header column count.
        expected: usize,
        /// Row column count.
        got: usize,
    },

    /// Returned when a cell is NaN, infinite, or not parseable as a float.
    #[error("non-finite value in {path}: row {row_index}, column {col_index}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// The offending file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// Zero-based column index.
        col_index: usize,
        /// The raw cell contents.
        raw: String,
    },

    /// Returned when a row carries a non-positive focal length.
    #[error("invalid focal length {focal_length} in {path}, row {row_index}")]
    InvalidFocalLength {
        /// The offending file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
        /// The rejected value.
        focal_length: f64,
    },

    /// Returned when a row's camera pose differs from the frame's first row.
    #[error("camera pose changes within {path} at row {row_index}: a frame must repeat one pose")]
    PoseMismatch {
        /// The offending file.
        path: PathBuf,
        /// Zero-based data row index.
        row_index: usize,
    },

    /// Returned when a run name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid run name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidRunName {
        /// The rejected name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a report file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}
