//! Trained model artifact: manifest plus regressor weights
//!
//! On disk an artifact is a directory:
//!
//! ```text
//! model/
//!   manifest.json   ordered columns, fitted encoders, layer sizes
//!   weights.mpk     burn record of the regressor
//! ```

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::preprocess::Preprocessor;
use super::regressor::{MlpRegressor, RegressorConfig};
use crate::features::{FeatureTable, SchemaRegistry};
use crate::{DeliveryError, Result};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const WEIGHTS_FILE: &str = "weights";

/// CPU backend used for serving predictions
pub type InferenceBackend = burn::backend::NdArray<f32>;

/// The opaque model contract: a single-row table in, predictions out
pub trait DeliveryModel {
    /// Column names in the order the model was fit on
    fn columns(&self) -> Vec<&str>;

    /// Predict for every row of the table
    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>>;
}

/// Metadata describing how the model consumes its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelManifest {
    pub name: String,
    /// Label the model was trained to predict
    pub target: String,
    pub columns: Preprocessor,
    pub regressor: RegressorConfig,
}

impl ModelManifest {
    pub fn validate(&self) -> Result<()> {
        self.columns.validate()?;
        let encoded = self.columns.output_dim();
        if encoded != self.regressor.input_dim {
            return Err(DeliveryError::ModelLoad(format!(
                "encoded width {} does not match regressor input {}",
                encoded, self.regressor.input_dim
            )));
        }
        Ok(())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeliveryError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        let manifest: ModelManifest = serde_json::from_str(&content)
            .map_err(|e| DeliveryError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        manifest.validate()?;
        Ok(manifest)
    }
}

/// A loaded, read-only model
pub struct ModelArtifact<B: Backend = InferenceBackend> {
    manifest: ModelManifest,
    regressor: MlpRegressor<B>,
    device: B::Device,
}

impl<B: Backend> ModelArtifact<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Create an artifact with freshly initialized weights
    pub fn new(manifest: ModelManifest, device: B::Device) -> Result<Self> {
        manifest.validate()?;
        let regressor = MlpRegressor::new(&device, &manifest.regressor);
        Ok(ModelArtifact {
            manifest,
            regressor,
            device,
        })
    }

    /// Load an artifact directory; any failure is a `ModelLoad` error
    pub fn load<P: AsRef<Path>>(dir: P, device: B::Device) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DeliveryError::ModelLoad(format!(
                "artifact directory {} does not exist",
                dir.display()
            )));
        }

        let manifest = ModelManifest::from_file(&dir.join(MANIFEST_FILE))?;
        let regressor = MlpRegressor::load(&device, &dir.join(WEIGHTS_FILE), &manifest.regressor)?;

        log::info!(
            "Loaded model '{}' from {} ({} columns, {} encoded inputs)",
            manifest.name,
            dir.display(),
            manifest.columns.columns().len(),
            manifest.regressor.input_dim
        );

        Ok(ModelArtifact {
            manifest,
            regressor,
            device,
        })
    }

    /// Write the manifest and weights into a directory
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let manifest = serde_json::to_string_pretty(&self.manifest)?;
        std::fs::write(dir.join(MANIFEST_FILE), manifest)?;
        self.regressor.save(&dir.join(WEIGHTS_FILE))
    }

    pub fn manifest(&self) -> &ModelManifest {
        &self.manifest
    }

    /// Compare the artifact with the schema registry
    ///
    /// Column order and kinds must agree exactly. Categories the registry
    /// offers but the encoders never saw are returned as warnings, since
    /// requests using them will be rejected at predict time.
    pub fn check_compatibility(&self, registry: &SchemaRegistry) -> Result<Vec<String>> {
        let model_columns = self.columns();
        let registry_columns = registry.names();
        if model_columns != registry_columns {
            return Err(DeliveryError::ModelLoad(format!(
                "model columns {:?} do not match schema columns {:?}",
                model_columns, registry_columns
            )));
        }

        let mut warnings = Vec::new();
        for (spec, column) in registry
            .list_features()
            .iter()
            .zip(self.manifest.columns.columns())
        {
            if spec.is_categorical() != column.encoding.is_categorical() {
                return Err(DeliveryError::ModelLoad(format!(
                    "feature '{}' is {} in the schema but the model encodes it differently",
                    spec.name,
                    spec.kind.label()
                )));
            }

            if let (Some(domain), Some(fitted)) = (spec.domain(), column.encoding.categories()) {
                for value in domain {
                    if !fitted.contains(value) {
                        let warning = format!(
                            "'{}' is offered for '{}' but the model was not fitted on it",
                            value, spec.name
                        );
                        log::warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
                for value in fitted {
                    if !domain.contains(value) {
                        log::debug!(
                            "Model category '{}' for '{}' is absent from the reference dataset",
                            value,
                            spec.name
                        );
                    }
                }
            }
        }

        Ok(warnings)
    }
}

impl<B: Backend> DeliveryModel for ModelArtifact<B> {
    fn columns(&self) -> Vec<&str> {
        self.manifest.columns.names()
    }

    fn predict(&self, table: &FeatureTable) -> Result<Vec<f64>> {
        let row = self.manifest.columns.transform(table)?;
        self.regressor.predict_row(&row, &self.device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureSpec, FeatureValue};
    use crate::model::preprocess::{ColumnEncoding, ColumnTransform};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn manifest() -> ModelManifest {
        let columns = Preprocessor::new(vec![
            ColumnTransform::new("age", ColumnEncoding::Standard { mean: 30.0, std: 6.0 }),
            ColumnTransform::new(
                "weather",
                ColumnEncoding::OneHot {
                    categories: vec!["Sunny".into(), "Stormy".into()],
                },
            ),
            ColumnTransform::new("distance", ColumnEncoding::Standard { mean: 8.0, std: 4.0 }),
        ])
        .unwrap();

        ModelManifest {
            name: "test".to_string(),
            target: "time_taken".to_string(),
            regressor: RegressorConfig::new(columns.output_dim(), vec![8]),
            columns,
        }
    }

    fn table() -> FeatureTable {
        FeatureTable::new(
            vec!["age".into(), "weather".into(), "distance".into()],
            vec![
                FeatureValue::Numeric(30.0),
                FeatureValue::Category("Sunny".into()),
                FeatureValue::Numeric(5.2),
            ],
        )
        .unwrap()
    }

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("eta-artifact-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn test_predict_single_value() {
        let artifact = ModelArtifact::<TestBackend>::new(manifest(), Default::default()).unwrap();
        let out = artifact.predict(&table()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite() && out[0] >= 0.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = temp_dir("roundtrip");
        let artifact = ModelArtifact::<TestBackend>::new(manifest(), Default::default()).unwrap();
        artifact.save(&dir).unwrap();

        let loaded = ModelArtifact::<TestBackend>::load(&dir, Default::default()).unwrap();
        assert_eq!(loaded.manifest(), artifact.manifest());
        assert_eq!(
            loaded.predict(&table()).unwrap(),
            artifact.predict(&table()).unwrap()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_artifact_is_model_load_error() {
        let result = ModelArtifact::<TestBackend>::load("/nonexistent/eta/model", Default::default());
        assert!(matches!(result, Err(DeliveryError::ModelLoad(_))));
    }

    #[test]
    fn test_corrupt_manifest() {
        let dir = temp_dir("corrupt");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), "{ not json").unwrap();

        let result = ModelArtifact::<TestBackend>::load(&dir, Default::default());
        assert!(matches!(result, Err(DeliveryError::ModelLoad(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_width_mismatch_rejected() {
        let mut m = manifest();
        m.regressor.input_dim = 7;
        assert!(matches!(
            ModelArtifact::<TestBackend>::new(m, Default::default()),
            Err(DeliveryError::ModelLoad(_))
        ));
    }

    #[test]
    fn test_compatibility() {
        let artifact = ModelArtifact::<TestBackend>::new(manifest(), Default::default()).unwrap();

        let matching = SchemaRegistry::new(vec![
            FeatureSpec::numeric("age", None),
            FeatureSpec::categorical("weather", vec!["Sunny", "Stormy", "Fog"]),
            FeatureSpec::numeric("distance", None),
        ])
        .unwrap();
        let warnings = artifact.check_compatibility(&matching).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("Fog"));

        let reordered = SchemaRegistry::new(vec![
            FeatureSpec::categorical("weather", vec!["Sunny"]),
            FeatureSpec::numeric("age", None),
            FeatureSpec::numeric("distance", None),
        ])
        .unwrap();
        assert!(artifact.check_compatibility(&reordered).is_err());

        let wrong_kind = SchemaRegistry::new(vec![
            FeatureSpec::numeric("age", None),
            FeatureSpec::numeric("weather", None),
            FeatureSpec::numeric("distance", None),
        ])
        .unwrap();
        assert!(artifact.check_compatibility(&wrong_kind).is_err());
    }
}
