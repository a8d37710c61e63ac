//! Trained model artifact
//!
//! - Preprocessor: fitted per-column encoders (scaling, one-hot, ordinal)
//! - Regressor: feed-forward network producing minutes
//! - Artifact: manifest + weights loaded once at startup

pub mod artifact;
pub mod preprocess;
pub mod regressor;

pub use artifact::{DeliveryModel, InferenceBackend, ModelArtifact, ModelManifest};
pub use preprocess::{ColumnEncoding, ColumnTransform, Preprocessor};
pub use regressor::{MlpRegressor, RegressorConfig};
