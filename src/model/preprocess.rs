//! Column preprocessing applied before the regressor
//!
//! Each input column carries the encoder fitted at training time. Encoders
//! are frozen: a category they were not fitted on cannot be represented and
//! is rejected instead of being mapped to a default.

use crate::features::{FeatureTable, FeatureValue};
use crate::{DeliveryError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Fitted encoder for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "encoder", rename_all = "snake_case")]
pub enum ColumnEncoding {
    /// z-score: (x - mean) / std
    Standard { mean: f64, std: f64 },
    /// One indicator per category, in fitted order
    OneHot { categories: Vec<String> },
    /// Category index, in fitted order
    Ordinal { categories: Vec<String> },
    /// Numeric value fed as-is
    Passthrough,
}

impl ColumnEncoding {
    /// Number of model inputs this column expands to
    pub fn width(&self) -> usize {
        match self {
            ColumnEncoding::OneHot { categories } => categories.len(),
            _ => 1,
        }
    }

    /// Categories the encoder was fitted on, if it is a categorical encoder
    pub fn categories(&self) -> Option<&[String]> {
        match self {
            ColumnEncoding::OneHot { categories } | ColumnEncoding::Ordinal { categories } => {
                Some(categories)
            }
            _ => None,
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.categories().is_some()
    }

    fn encode(&self, name: &str, value: &FeatureValue, out: &mut Vec<f32>) -> Result<()> {
        match (self, value) {
            (ColumnEncoding::Standard { mean, std }, FeatureValue::Numeric(x)) => {
                out.push(((x - mean) / std) as f32);
            }
            (ColumnEncoding::Passthrough, FeatureValue::Numeric(x)) => {
                out.push(*x as f32);
            }
            (ColumnEncoding::OneHot { categories }, FeatureValue::Category(c)) => {
                let idx = category_index(name, categories, c)?;
                out.extend((0..categories.len()).map(|i| if i == idx { 1.0 } else { 0.0 }));
            }
            (ColumnEncoding::Ordinal { categories }, FeatureValue::Category(c)) => {
                let idx = category_index(name, categories, c)?;
                out.push(idx as f32);
            }
            (encoding, value) => {
                return Err(DeliveryError::Inference(format!(
                    "column '{}' uses a {} encoder but received '{}'",
                    name,
                    encoding.label(),
                    value
                )));
            }
        }
        Ok(())
    }

    fn label(&self) -> &'static str {
        match self {
            ColumnEncoding::Standard { .. } => "standard",
            ColumnEncoding::OneHot { .. } => "one-hot",
            ColumnEncoding::Ordinal { .. } => "ordinal",
            ColumnEncoding::Passthrough => "passthrough",
        }
    }
}

fn category_index(name: &str, categories: &[String], value: &str) -> Result<usize> {
    categories
        .iter()
        .position(|c| c == value)
        .ok_or_else(|| DeliveryError::UnknownCategory {
            name: name.to_string(),
            value: value.to_string(),
        })
}

/// A named column and its encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTransform {
    pub name: String,
    #[serde(flatten)]
    pub encoding: ColumnEncoding,
}

impl ColumnTransform {
    pub fn new(name: impl Into<String>, encoding: ColumnEncoding) -> Self {
        ColumnTransform {
            name: name.into(),
            encoding,
        }
    }
}

/// Ordered per-column encoders, applied positionally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Preprocessor {
    columns: Vec<ColumnTransform>,
}

impl Preprocessor {
    pub fn new(columns: Vec<ColumnTransform>) -> Result<Self> {
        let preprocessor = Preprocessor { columns };
        preprocessor.validate()?;
        Ok(preprocessor)
    }

    /// Check the fitted parameters are usable
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(DeliveryError::ModelLoad("preprocessor has no columns".to_string()));
        }

        let mut seen = HashSet::new();
        for col in &self.columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DeliveryError::ModelLoad(format!(
                    "column '{}' appears twice in the preprocessor",
                    col.name
                )));
            }
            match &col.encoding {
                ColumnEncoding::Standard { mean, std } => {
                    if !mean.is_finite() || !std.is_finite() || *std <= 0.0 {
                        return Err(DeliveryError::ModelLoad(format!(
                            "column '{}' has invalid scaler parameters (mean {}, std {})",
                            col.name, mean, std
                        )));
                    }
                }
                ColumnEncoding::OneHot { categories } | ColumnEncoding::Ordinal { categories } => {
                    if categories.is_empty() {
                        return Err(DeliveryError::ModelLoad(format!(
                            "column '{}' has an encoder with no categories",
                            col.name
                        )));
                    }
                }
                ColumnEncoding::Passthrough => {}
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnTransform] {
        &self.columns
    }

    /// Column names in the order the model was fit on
    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Width of the encoded row
    pub fn output_dim(&self) -> usize {
        self.columns.iter().map(|c| c.encoding.width()).sum()
    }

    /// Encode a single-row table, column by column in fitted order
    pub fn transform(&self, table: &FeatureTable) -> Result<Vec<f32>> {
        let expected = self.names();
        if table.columns() != expected.as_slice() {
            return Err(DeliveryError::Inference(format!(
                "feature table columns {:?} do not match the model columns {:?}",
                table.columns(),
                expected
            )));
        }

        let mut out = Vec::with_capacity(self.output_dim());
        for (col, value) in self.columns.iter().zip(table.row()) {
            col.encoding.encode(&col.name, value, &mut out)?;
        }
        Ok(out)
    }
}
