//! Model persistence - save and load the model artifact as JSON

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::FeatureRow;
use super::model::LinearModel;

/// Serializable model parameters and metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedModel {
    /// Version for backward compatibility
    pub version: u32,
    /// When the model was trained
    pub created_at: DateTime<Utc>,
    /// Feature columns in the order the coefficients apply to
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Number of samples used for training
    pub training_samples: usize,
}

impl PersistedModel {
    /// Current version number
    pub const CURRENT_VERSION: u32 = 1;

    /// Create a new persisted model record for the pipeline's feature layout
    pub fn new(model: &LinearModel, training_samples: usize) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            created_at: Utc::now(),
            feature_names: FeatureRow::feature_names()
                .into_iter()
                .map(String::from)
                .collect(),
            coefficients: model.coefficients().to_vec(),
            intercept: model.intercept(),
            training_samples,
        }
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;

        Ok(())
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        if !path.exists() {
            return Err(PersistenceError::FileNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let bytes = fs::read(path)?;
        let model: Self = serde_json::from_slice(&bytes)?;

        // Version check
        if model.version > Self::CURRENT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: Self::CURRENT_VERSION,
                found: model.version,
            });
        }

        Ok(model)
    }

    /// Build the runtime model, checking the artifact was trained on the
    /// same feature layout the pipeline produces.
    pub fn into_model(self) -> Result<LinearModel, PersistenceError> {
        let expected = FeatureRow::feature_names();
        if self.feature_names != expected {
            return Err(PersistenceError::FeatureMismatch {
                expected: expected.join(", "),
                found: self.feature_names.join(", "),
            });
        }

        let found = self.coefficients.len();
        LinearModel::new(self.coefficients, self.intercept).ok_or(
            PersistenceError::FeatureMismatch {
                expected: format!("{} coefficients", FeatureRow::NUM_FEATURES),
                found: format!("{found} coefficients"),
            },
        )
    }

    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "Model v{}: {} features, {} samples, created {}",
            self.version,
            self.feature_names.len(),
            self.training_samples,
            self.created_at.format("%Y-%m-%d %H:%M UTC")
        )
    }
}

/// Load the model artifact and build the runtime model in one step.
pub fn load_model(path: &Path) -> Result<LinearModel, PersistenceError> {
    let persisted = PersistedModel::load(path)?;
    tracing::info!("Loaded {}", persisted.summary());
    persisted.into_model()
}

/// Errors that can occur during model persistence
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Model file not found: {0}")]
    FileNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed model artifact: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Model version mismatch: expected v{expected}, found v{found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Model feature layout mismatch: expected [{expected}], found [{found}]")]
    FeatureMismatch { expected: String, found: String },
}
