use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{BODY_MODEL_NAME, FACE_MODEL_NAME};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Detection settings, read fresh by detectors on every call.
///
/// JSON keys are camelCase; missing keys fall back to [`Default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionConfig {
    /// Allow detectors to reuse results from previous frames.
    pub skip_frame: bool,
    /// Directory searched for model files before the user cache.
    pub model_base_path: Option<PathBuf>,
    /// Base URL models are downloaded from when not found locally.
    pub model_base_url: Option<String>,
    pub body: BodyConfig,
    pub face: FaceConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BodyConfig {
    pub model_path: String,
    /// Consecutive frames allowed to reuse cached results.
    pub skip_frames: usize,
    pub max_detected: usize,
    pub min_confidence: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FaceConfig {
    pub enabled: bool,
    pub model_path: String,
    pub min_confidence: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            skip_frame: true,
            model_base_path: None,
            model_base_url: None,
            body: BodyConfig::default(),
            face: FaceConfig::default(),
        }
    }
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            model_path: BODY_MODEL_NAME.to_string(),
            skip_frames: 1,
            max_detected: 1,
            min_confidence: 0.2,
        }
    }
}

impl Default for FaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model_path: FACE_MODEL_NAME.to_string(),
            min_confidence: 0.1,
        }
    }
}

impl DetectionConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.body.max_detected == 0 {
            return Err(ConfigError::Invalid(
                "body.maxDetected must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.body.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "body.minConfidence must be between 0.0 and 1.0, got {}",
                self.body.min_confidence
            )));
        }
        if !(0.0..=1.0).contains(&self.face.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "face.minConfidence must be between 0.0 and 1.0, got {}",
                self.face.min_confidence
            )));
        }
        Ok(())
    }
}
