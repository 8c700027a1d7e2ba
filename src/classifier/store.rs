// On-disk persistence for fitted models
//
// Files are JSON envelopes tagged with a format version and the classifier
// name. Writes go to a sibling temp file first and are renamed into place.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::{ActiveModel, ClassifierError};
use crate::error::{ColetaError, Result};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelFile<T> {
    format_version: u32,
    classifier: String,
    #[serde(flatten)]
    active: T,
}

/// Persists the active model to a single file
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write `active` for `classifier`, replacing any previous file
    pub fn save<M: Serialize>(&self, classifier: &str, active: &ActiveModel<M>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ColetaError::Io {
                source: e,
                context: format!("Failed to create model directory: {:?}", parent),
            })?;
        }

        let file = ModelFile {
            format_version: FORMAT_VERSION,
            classifier: classifier.to_string(),
            active,
        };
        let content = serde_json::to_vec(&file).map_err(|e| ColetaError::Json {
            source: e,
            context: "Failed to serialize model".to_string(),
        })?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, content).map_err(|e| ColetaError::Io {
            source: e,
            context: format!("Failed to write model file: {:?}", tmp),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ColetaError::Io {
            source: e,
            context: format!("Failed to move model file into place: {:?}", self.path),
        })?;

        tracing::info!("Model saved to {}", self.path.display());
        Ok(())
    }

    /// Load the stored model; `Ok(None)` when no model has been saved yet
    pub fn load<M: DeserializeOwned>(&self, classifier: &str) -> Result<Option<ActiveModel<M>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read(&self.path).map_err(|e| ColetaError::Io {
            source: e,
            context: format!("Failed to read model file: {:?}", self.path),
        })?;
        let file: ModelFile<ActiveModel<M>> =
            serde_json::from_slice(&content).map_err(|e| ColetaError::Json {
                source: e,
                context: format!("Failed to parse model file: {:?}", self.path),
            })?;

        if file.format_version != FORMAT_VERSION {
            return Err(ClassifierError::IncompatibleModel(format!(
                "format version {} (expected {})",
                file.format_version, FORMAT_VERSION
            ))
            .into());
        }
        if file.classifier != classifier {
            return Err(ClassifierError::IncompatibleModel(format!(
                "trained by '{}', active classifier is '{}'",
                file.classifier, classifier
            ))
            .into());
        }

        Ok(Some(file.active))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path().join("model.json"));

        let loaded: Option<ActiveModel<Vec<f64>>> = store.load("test").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path().join("models").join("model.json"));

        let active = ActiveModel::new(vec![0.25, -1.5], "abc", 12);
        store.save("test", &active).unwrap();
        assert!(store.exists());

        let loaded: ActiveModel<Vec<f64>> = store.load("test").unwrap().unwrap();
        assert_eq!(loaded.model, vec![0.25, -1.5]);
        assert_eq!(loaded.fingerprint, "abc");
        assert_eq!(loaded.example_count, 12);
        assert_eq!(loaded.trained_at, active.trained_at);
    }

    #[test]
    fn test_classifier_mismatch() {
        let temp = TempDir::new().unwrap();
        let store = ModelStore::new(temp.path().join("model.json"));
        store
            .save("first", &ActiveModel::new(vec![1.0], "abc", 1))
            .unwrap();

        let err = store.load::<Vec<f64>>("second").unwrap_err();
        assert!(matches!(
            err,
            ColetaError::Classifier(ClassifierError::IncompatibleModel(_))
        ));
    }

    #[test]
    fn test_corrupt_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = ModelStore::new(path);
        assert!(store.load::<Vec<f64>>("test").is_err());
    }
}
