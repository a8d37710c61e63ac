//! Schema registry: the ordered feature list the model was fit on
//!
//! The registry is the single source of truth for column order. The form
//! prompts and the feature table assembly both read it; nothing else is
//! allowed to hardcode the order.

use crate::data::ReferenceDataset;
use crate::{DeliveryError, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Advisory numeric range; values outside it are flagged, not rejected
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Bounds { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Semantic kind of a feature, with its domain or bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeatureKind {
    Numeric { bounds: Option<Bounds> },
    Categorical { domain: Vec<String> },
    /// Two-valued enum such as Yes/No; validated like any other category
    BooleanLike { domain: Vec<String> },
}

impl FeatureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FeatureKind::Numeric { .. } => "numeric",
            FeatureKind::Categorical { .. } => "categorical",
            FeatureKind::BooleanLike { .. } => "boolean-like",
        }
    }
}

/// Declared metadata for one model input column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl FeatureSpec {
    pub fn numeric(name: impl Into<String>, bounds: Option<Bounds>) -> Self {
        FeatureSpec {
            name: name.into(),
            kind: FeatureKind::Numeric { bounds },
        }
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, domain: Vec<S>) -> Self {
        FeatureSpec {
            name: name.into(),
            kind: FeatureKind::Categorical {
                domain: domain.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn boolean_like<S: Into<String>>(name: impl Into<String>, domain: Vec<S>) -> Self {
        FeatureSpec {
            name: name.into(),
            kind: FeatureKind::BooleanLike {
                domain: domain.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Valid values for categorical and boolean-like features
    pub fn domain(&self) -> Option<&[String]> {
        match &self.kind {
            FeatureKind::Numeric { .. } => None,
            FeatureKind::Categorical { domain } | FeatureKind::BooleanLike { domain } => {
                Some(domain)
            }
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        match &self.kind {
            FeatureKind::Numeric { bounds } => *bounds,
            _ => None,
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.domain().is_some()
    }
}

/// Kind as declared in the static catalog, before domains are known
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeclaredKind {
    Numeric(Option<Bounds>),
    Categorical,
    BooleanLike,
}

/// Static declaration of one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureDecl {
    pub name: &'static str,
    pub kind: DeclaredKind,
}

/// Immutable, ordered set of feature specs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaRegistry {
    features: Vec<FeatureSpec>,
}

impl SchemaRegistry {
    /// Build a registry from explicit specs, in model column order
    pub fn new(features: Vec<FeatureSpec>) -> Result<Self> {
        let mut seen = HashSet::new();
        for spec in &features {
            if !seen.insert(spec.name.as_str()) {
                return Err(DeliveryError::Config(format!(
                    "feature '{}' is declared twice",
                    spec.name
                )));
            }
        }
        Ok(SchemaRegistry { features })
    }

    /// Derive domains from the reference dataset for every declared feature
    ///
    /// The dataset must already have incomplete rows removed, which
    /// [`ReferenceDataset`] does on load.
    pub fn from_dataset(
        catalog: &[FeatureDecl],
        dataset: &ReferenceDataset,
        label_column: Option<&str>,
    ) -> Result<Self> {
        let mut features = Vec::with_capacity(catalog.len());

        for decl in catalog {
            if !dataset.has_column(decl.name) {
                return Err(DeliveryError::Dataset(format!(
                    "feature column '{}' is missing from the reference dataset",
                    decl.name
                )));
            }

            let spec = match decl.kind {
                DeclaredKind::Numeric(bounds) => FeatureSpec::numeric(decl.name, bounds),
                DeclaredKind::Categorical => {
                    let domain = Self::observed_domain(dataset, decl.name)?;
                    FeatureSpec::categorical(decl.name, domain)
                }
                DeclaredKind::BooleanLike => {
                    let domain = Self::observed_domain(dataset, decl.name)?;
                    if domain.len() > 2 {
                        return Err(DeliveryError::Dataset(format!(
                            "boolean-like column '{}' has {} distinct values: {:?}",
                            decl.name,
                            domain.len(),
                            domain
                        )));
                    }
                    FeatureSpec::boolean_like(decl.name, domain)
                }
            };

            log::debug!("Registered feature {} ({})", spec.name, spec.kind.label());
            features.push(spec);
        }

        for header in dataset.headers() {
            let declared = catalog.iter().any(|d| d.name == header.as_str());
            if !declared && Some(header.as_str()) != label_column {
                log::warn!(
                    "Dataset column '{}' is not a model feature and will be ignored",
                    header
                );
            }
        }

        Self::new(features)
    }

    fn observed_domain(dataset: &ReferenceDataset, name: &str) -> Result<Vec<String>> {
        let domain = dataset.distinct_values(name)?;
        if domain.is_empty() {
            return Err(DeliveryError::Dataset(format!(
                "no observed values for categorical column '{}'",
                name
            )));
        }
        Ok(domain)
    }

    /// Features in model training order
    pub fn list_features(&self) -> &[FeatureSpec] {
        &self.features
    }

    /// Look up a single feature
    pub fn feature(&self, name: &str) -> Result<&FeatureSpec> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| DeliveryError::UnknownFeature(name.to_string()))
    }

    /// Valid literal values of a categorical feature
    pub fn domain_of(&self, name: &str) -> Result<&[String]> {
        let spec = self.feature(name)?;
        spec.domain()
            .ok_or_else(|| DeliveryError::NotCategorical(name.to_string()))
    }

    /// Column names in model training order
    pub fn names(&self) -> Vec<&str> {
        self.features.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.name == name)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
