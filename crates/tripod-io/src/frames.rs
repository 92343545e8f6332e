//! Frame directory access: enumeration and keypoint CSV parsing.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};
use tripod_forest::{FrameId, SampleSource, TrainingSample};

use crate::domain::CameraPose;
use crate::projection::pixel_to_ray;
use crate::IoError;

/// Columns preceding the descriptor: pan, tilt, focal_length, u, v.
const POSE_COLS: usize = 5;

/// Reads keypoint frames from a directory of CSV files.
///
/// One file per frame, the file name serving as the frame id. Expected
/// CSV format:
/// - Header row required: `pan,tilt,focal_length,u,v,d0,d1,...,dn`
/// - One row per keypoint, all rows with the same column count
/// - The pose columns repeat the frame's single camera pose verbatim
///
/// Keypoint pixels are back-projected into pan/tilt rays at read time, so
/// the samples handed to the forest already live in ray space.
#[derive(Debug, Clone)]
pub struct FrameStore {
    root: PathBuf,
}

impl FrameStore {
    /// Create a store rooted at the given frame directory.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Enumerate the frames in the store, sorted by file name.
    ///
    /// Only `*.csv` entries are considered; anything else in the directory
    /// is ignored.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::DirRead`] | Directory missing or unreadable |
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn frames(&self) -> Result<Vec<FrameId>, IoError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| IoError::DirRead {
            path: self.root.clone(),
            source: e,
        })?;

        let mut frames = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| IoError::DirRead {
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv")
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                frames.push(FrameId::new(name));
            }
        }
        frames.sort();

        info!(n_frames = frames.len(), "frame directory scanned");
        Ok(frames)
    }

    /// Read and validate one frame file, back-projecting each keypoint.
    ///
    /// A file with a header but zero data rows is valid and yields an
    /// empty batch; the trainer decides whether that is acceptable.
    #[instrument(skip(self), fields(frame = %frame))]
    fn read_frame(
        &self,
        frame: &FrameId,
        principal_point: [f64; 2],
    ) -> Result<Vec<TrainingSample>, IoError> {
        let path = self.root.join(frame.as_str());

        let file = std::fs::File::open(&path).map_err(|e| IoError::FileNotFound {
            path: path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        if expected_cols < POSE_COLS + 1 {
            return Err(IoError::MissingDescriptorColumns {
                path,
                n_columns: expected_cols,
                min: POSE_COLS + 1,
            });
        }
        debug!(expected_cols, "read frame header");

        let mut samples = Vec::new();
        let mut pose: Option<CameraPose> = None;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path,
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let mut values = Vec::with_capacity(expected_cols);
            for col_index in 0..record.len() {
                let raw = record.get(col_index).unwrap_or("");
                let value: f64 = raw.parse().map_err(|_| IoError::NonFiniteValue {
                    path: path.clone(),
                    row_index,
                    col_index,
                    raw: raw.to_string(),
                })?;
                if !value.is_finite() {
                    return Err(IoError::NonFiniteValue {
                        path: path.clone(),
                        row_index,
                        col_index,
                        raw: raw.to_string(),
                    });
                }
                values.push(value);
            }

            if values[2] <= 0.0 {
                return Err(IoError::InvalidFocalLength {
                    path,
                    row_index,
                    focal_length: values[2],
                });
            }
            let row_pose = CameraPose::new(values[0], values[1], values[2]);
            match pose {
                None => pose = Some(row_pose),
                Some(first) if first != row_pose => {
                    return Err(IoError::PoseMismatch { path, row_index });
                }
                Some(_) => {}
            }

            let ray = pixel_to_ray(&row_pose, principal_point, [values[3], values[4]]);
            samples.push(TrainingSample::new(
                values[POSE_COLS..].to_vec(),
                ray.to_vec(),
            ));
        }

        debug!(n_samples = samples.len(), "frame loaded");
        Ok(samples)
    }
}

impl SampleSource for FrameStore {
    type Error = IoError;

    fn generate(
        &self,
        frame: &FrameId,
        principal_point: [f64; 2],
    ) -> Result<Vec<TrainingSample>, Self::Error> {
        self.read_frame(frame, principal_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::TempDir;

    const PRINCIPAL_POINT: [f64; 2] = [640.0, 360.0];

    fn write_frame(dir: &TempDir, name: &str, content: &str) {
        let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    fn generate(dir: &TempDir, name: &str) -> Result<Vec<TrainingSample>, IoError> {
        FrameStore::new(dir.path()).generate(&FrameId::new(name), PRINCIPAL_POINT)
    }

    // --- Enumeration ---

    #[test]
    fn frames_are_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        write_frame(&dir, "frame_2.csv", "pan,tilt,focal_length,u,v,d0\n");
        write_frame(&dir, "frame_1.csv", "pan,tilt,focal_length,u,v,d0\n");
        write_frame(&dir, "notes.txt", "not a frame\n");
        let frames = FrameStore::new(dir.path()).frames().unwrap();
        let names: Vec<&str> = frames.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, ["frame_1.csv", "frame_2.csv"]);
    }

    #[test]
    fn missing_directory_is_reported() {
        let result = FrameStore::new(Path::new("/nonexistent/frames")).frames();
        assert!(matches!(result, Err(IoError::DirRead { .. })));
    }

    // --- Parsing ---

    #[test]
    fn center_keypoint_back_projects_to_the_pose() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0,d1\n12.5,-3.0,3000,640,360,0.25,0.75\n",
        );
        let samples = generate(&dir, "f.csv").unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].descriptor, vec![0.25, 0.75]);
        assert!((samples[0].ray[0] - 12.5).abs() < 1e-9);
        assert!((samples[0].ray[1] - (-3.0)).abs() < 1e-9);
    }

    #[test]
    fn every_row_becomes_a_sample() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0\n\
             0,0,3000,100,100,1.0\n\
             0,0,3000,640,360,2.0\n\
             0,0,3000,1200,700,3.0\n",
        );
        let samples = generate(&dir, "f.csv").unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[1].descriptor, vec![2.0]);
        assert_eq!(samples[1].ray.len(), 2);
    }

    #[test]
    fn header_only_frame_yields_zero_samples() {
        let dir = TempDir::new().unwrap();
        write_frame(&dir, "empty.csv", "pan,tilt,focal_length,u,v,d0\n");
        let samples = generate(&dir, "empty.csv").unwrap();
        assert!(samples.is_empty());
    }

    // --- Errors ---

    #[test]
    fn error_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = generate(&dir, "absent.csv");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_too_few_columns() {
        let dir = TempDir::new().unwrap();
        write_frame(&dir, "f.csv", "pan,tilt,focal_length,u,v\n1,2,3000,4,5\n");
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::MissingDescriptorColumns {
                n_columns: 5,
                min: 6,
                ..
            })
        ));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0\n0,0,3000,1,2,3\n0,0,3000,1,2\n",
        );
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::InconsistentRowLength { row_index: 1, .. })
        ));
    }

    #[test]
    fn error_non_finite_cell() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0\n0,0,3000,1,2,NaN\n",
        );
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue { col_index: 5, .. })
        ));
    }

    #[test]
    fn error_unparseable_cell() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0\n0,abc,3000,1,2,3\n",
        );
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::NonFiniteValue { col_index: 1, .. })
        ));
    }

    #[test]
    fn error_zero_focal_length() {
        let dir = TempDir::new().unwrap();
        write_frame(&dir, "f.csv", "pan,tilt,focal_length,u,v,d0\n0,0,0,1,2,3\n");
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::InvalidFocalLength { row_index: 0, .. })
        ));
    }

    #[test]
    fn error_pose_changes_mid_frame() {
        let dir = TempDir::new().unwrap();
        write_frame(
            &dir,
            "f.csv",
            "pan,tilt,focal_length,u,v,d0\n10,0,3000,1,2,3\n11,0,3000,1,2,3\n",
        );
        let result = generate(&dir, "f.csv");
        assert!(matches!(
            result,
            Err(IoError::PoseMismatch { row_index: 1, .. })
        ));
    }
}
