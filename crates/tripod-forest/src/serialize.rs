//! Model persistence via a versioned bincode envelope.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::ForestError;
use crate::model::{Dims, RayForest};
use crate::tree::Tree;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Envelope wrapping a serialized model with version metadata.
#[derive(Serialize, Deserialize)]
#[serde(bound(
    serialize = "T: Serialize, T::Config: Serialize",
    deserialize = "T: DeserializeOwned, T::Config: DeserializeOwned"
))]
struct ModelEnvelope<T: Tree> {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Number of trained members.
    n_trees: usize,
    /// Dimensionality fixed during training, if any.
    dims: Option<Dims>,
    /// Induction config shared by the members.
    tree_config: T::Config,
    /// The member trees.
    trees: Vec<T>,
}

impl<T: Tree> RayForest<T> {
    /// Save the model to a binary file.
    ///
    /// The file wraps the ensemble in a versioned envelope so later
    /// builds can refuse formats they do not understand.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::SerializeModel`] | bincode encoding failed |
    /// | [`ForestError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ForestError>
    where
        T: Serialize + Clone,
        T::Config: Serialize,
    {
        let path = path.as_ref();

        let envelope = ModelEnvelope {
            format_version: FORMAT_VERSION,
            n_trees: self.trees.len(),
            dims: self.dims,
            tree_config: self.tree_config.clone(),
            trees: self.trees.clone(),
        };

        let bytes = bincode::serialize(&envelope)
            .map_err(|e| ForestError::SerializeModel { source: e })?;
        std::fs::write(path, &bytes).map_err(|e| ForestError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            n_trees = envelope.n_trees,
            bytes = bytes.len(),
            "model saved"
        );
        Ok(())
    }

    /// Load a model from a binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---------|-----------|
    /// | [`ForestError::ReadModel`] | file read failed |
    /// | [`ForestError::DeserializeModel`] | bincode decoding failed |
    /// | [`ForestError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ForestError>
    where
        T: DeserializeOwned,
        T::Config: DeserializeOwned,
    {
        let path = path.as_ref();

        let bytes = std::fs::read(path).map_err(|e| ForestError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let envelope: ModelEnvelope<T> =
            bincode::deserialize(&bytes).map_err(|e| ForestError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(ForestError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        debug!(n_trees = envelope.n_trees, "model loaded");

        Ok(RayForest {
            trees: envelope.trees,
            dims: envelope.dims,
            tree_config: envelope.tree_config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{FixedConfig, FixedTree, fixed_model};

    #[test]
    fn save_load_round_trip_preserves_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.bin");

        let model = fixed_model(&[(vec![10.0, -5.0], 0.5), (vec![12.0, -4.0], 1.5)]);
        model.save(&path).unwrap();

        let restored = RayForest::<FixedTree>::load(&path).unwrap();
        assert_eq!(restored.n_trees(), 2);
        assert_eq!(restored.feature_dim(), Some(2));

        let probe = vec![0.25, 0.75];
        assert_eq!(
            restored.predict(&probe, 4).unwrap(),
            model.predict(&probe, 4).unwrap()
        );
    }

    #[test]
    fn untrained_model_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");

        let model: RayForest<FixedTree> = RayForest {
            trees: Vec::new(),
            dims: None,
            tree_config: FixedConfig,
        };
        model.save(&path).unwrap();

        let restored = RayForest::<FixedTree>::load(&path).unwrap();
        assert!(restored.is_empty());
        assert_eq!(restored.feature_dim(), None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = RayForest::<FixedTree>::load("/nonexistent/model.bin");
        assert!(matches!(result, Err(ForestError::ReadModel { .. })));
    }

    #[test]
    fn corrupt_file_is_a_deserialize_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a model").unwrap();

        let result = RayForest::<FixedTree>::load(&path);
        assert!(matches!(result, Err(ForestError::DeserializeModel { .. })));
    }

    #[test]
    fn future_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.bin");

        let envelope = ModelEnvelope::<FixedTree> {
            format_version: FORMAT_VERSION + 1,
            n_trees: 0,
            dims: None,
            tree_config: FixedConfig,
            trees: Vec::new(),
        };
        std::fs::write(&path, bincode::serialize(&envelope).unwrap()).unwrap();

        let result = RayForest::<FixedTree>::load(&path);
        assert!(matches!(
            result,
            Err(ForestError::IncompatibleModelVersion { found, .. }) if found == FORMAT_VERSION + 1
        ));
    }
}
