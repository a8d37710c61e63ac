//! Delivery time prediction
//!
//! Validates delivery-order attributes against the schema a regression model
//! was trained on, assembles them into a single-row feature table and asks the
//! model for the expected delivery time.

pub mod data;
pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Predicted delivery time in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub minutes: f64,
}

impl PredictionResult {
    /// Wrap a model output, rejecting values that cannot be a delivery time
    pub fn from_model_output(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(DeliveryError::Inference(format!(
                "model produced a non-finite prediction: {}",
                value
            )));
        }
        if value < 0.0 {
            return Err(DeliveryError::Inference(format!(
                "model produced a negative delivery time: {}",
                value
            )));
        }
        // Adding zero turns -0.0 into 0.0
        Ok(PredictionResult {
            minutes: value + 0.0,
        })
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} mins", self.minutes)
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Missing value for field '{0}'")]
    MissingField(String),

    #[error("Field '{name}' expects a number, got '{value}'")]
    InvalidNumeric { name: String, value: String },

    #[error("'{value}' is not a known value for '{name}'")]
    UnknownCategory { name: String, value: String },

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Feature '{0}' is numeric and has no category domain")]
    NotCategorical(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DeliveryError {
    /// Errors caused by a single submission; the form reports them and keeps going
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            DeliveryError::MissingField(_)
                | DeliveryError::InvalidNumeric { .. }
                | DeliveryError::UnknownCategory { .. }
                | DeliveryError::UnknownFeature(_)
                | DeliveryError::NotCategorical(_)
                | DeliveryError::Inference(_)
                | DeliveryError::Parse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DeliveryError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Reference dataset the categorical domains are read from
    pub dataset_path: String,
    /// Target column, present in the dataset but not a model input
    pub label_column: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Directory holding manifest.json and the weight record
    pub artifact_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                dataset_path: "data/swiggy_cleaned.csv".to_string(),
                label_column: "time_taken".to_string(),
            },
            model: ModelConfig {
                artifact_dir: "model".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DeliveryError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| DeliveryError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DeliveryError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_display() {
        let p = PredictionResult { minutes: 27.456 };
        assert_eq!(p.to_string(), "27.46 mins");
    }

    #[test]
    fn test_prediction_rejects_bad_output() {
        assert!(PredictionResult::from_model_output(-0.5).is_err());
        assert!(PredictionResult::from_model_output(f64::NAN).is_err());
        assert!(PredictionResult::from_model_output(0.0).is_ok());
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        let p = PredictionResult::from_model_output(-0.0).unwrap();
        assert!(p.minutes.is_sign_positive());
        assert_eq!(p.to_string(), "0.00 mins");
    }

    #[test]
    fn test_request_errors_are_recoverable() {
        assert!(DeliveryError::MissingField("age".into()).is_request_error());
        assert!(DeliveryError::UnknownCategory {
            name: "weather".into(),
            value: "Foggy".into()
        }
        .is_request_error());
        assert!(!DeliveryError::ModelLoad("missing".into()).is_request_error());
    }

    #[test]
    fn test_config_round_trip() {
        let path = std::env::temp_dir().join(format!("eta-config-{}.toml", std::process::id()));
        let path = path.to_string_lossy().to_string();

        let mut config = Config::default();
        config.model.artifact_dir = "artifacts/v1".to_string();
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.model.artifact_dir, "artifacts/v1");
        assert_eq!(loaded.data.label_column, "time_taken");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_config_missing_file() {
        let err = Config::load("/nonexistent/eta/config.toml").unwrap_err();
        assert!(matches!(err, DeliveryError::Config(_)));
    }
}
