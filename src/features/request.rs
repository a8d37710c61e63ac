//! Inference request building
//!
//! Turns raw field values from the form layer into a validated request and
//! the single-row feature table the model consumes.

use super::schema::{Bounds, FeatureKind, SchemaRegistry};
use crate::{DeliveryError, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Raw field values keyed by feature name, as supplied by the form layer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawValues {
    values: HashMap<String, String>,
}

impl RawValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Parse a `name=value` assignment
    pub fn parse_assignment(assignment: &str) -> Result<(String, String)> {
        let (name, value) = assignment.split_once('=').ok_or_else(|| {
            DeliveryError::Parse(format!("expected name=value, got '{}'", assignment))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DeliveryError::Parse(format!(
                "missing field name in '{}'",
                assignment
            )));
        }
        Ok((name.to_string(), value.to_string()))
    }

    /// Read a flat JSON object; numbers and booleans keep their JSON spelling
    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| DeliveryError::Parse(format!("invalid raw values JSON: {}", e)))?;
        let object = parsed
            .as_object()
            .ok_or_else(|| DeliveryError::Parse("raw values must be a JSON object".to_string()))?;

        let mut raw = RawValues::new();
        for (name, value) in object {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                // Null leaves the field unset so it reports as missing
                serde_json::Value::Null => continue,
                other => {
                    return Err(DeliveryError::Parse(format!(
                        "field '{}' has unsupported value {}",
                        name, other
                    )))
                }
            };
            raw.insert(name.clone(), text);
        }
        Ok(raw)
    }

    /// Read raw values from a JSON file
    ///
    /// An unreadable file is a problem with this submission, so it reports
    /// as [`DeliveryError::Parse`] rather than an IO failure.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            DeliveryError::Parse(format!("Failed to read input {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RawValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawValues::new();
        for (k, v) in iter {
            raw.insert(k, v);
        }
        raw
    }
}

/// A validated, typed feature value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Category(String),
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(v) => write!(f, "{}", v),
            FeatureValue::Category(c) => write!(f, "{}", c),
        }
    }
}

/// Numeric value that fell outside its advisory range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundsViolation {
    pub name: String,
    pub value: f64,
    pub bounds: Bounds,
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside the usual range {}",
            self.name, self.value, self.bounds
        )
    }
}

/// One value per registered feature, in registry order
#[derive(Debug, Clone, PartialEq)]
pub struct InferenceRequest {
    values: Vec<(String, FeatureValue)>,
    violations: Vec<BoundsViolation>,
}

impl InferenceRequest {
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Advisory range warnings raised while building the request
    pub fn bound_violations(&self) -> &[BoundsViolation] {
        &self.violations
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Single-row table handed to the model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    columns: Vec<String>,
    row: Vec<FeatureValue>,
}

impl FeatureTable {
    pub fn new(columns: Vec<String>, row: Vec<FeatureValue>) -> Result<Self> {
        if columns.len() != row.len() {
            return Err(DeliveryError::Inference(format!(
                "feature table has {} columns but {} values",
                columns.len(),
                row.len()
            )));
        }
        Ok(FeatureTable { columns, row })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row(&self) -> &[FeatureValue] {
        &self.row
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|idx| &self.row[idx])
    }
}

/// Validates raw values against the schema registry
pub struct InferenceRequestBuilder<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> InferenceRequestBuilder<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        InferenceRequestBuilder { registry }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Validate and coerce every registered feature, in registry order
    pub fn build(&self, raw: &RawValues) -> Result<InferenceRequest> {
        for name in raw.names() {
            if !self.registry.contains(name) {
                log::warn!("Ignoring unknown field '{}'", name);
            }
        }

        let mut values = Vec::with_capacity(self.registry.len());
        let mut violations = Vec::new();

        for spec in self.registry.list_features() {
            let raw_value = raw
                .get(&spec.name)
                .ok_or_else(|| DeliveryError::MissingField(spec.name.clone()))?;

            let value = match &spec.kind {
                FeatureKind::Numeric { bounds } => {
                    let value = parse_numeric(&spec.name, raw_value)?;
                    if let Some(bounds) = bounds {
                        if !bounds.contains(value) {
                            let violation = BoundsViolation {
                                name: spec.name.clone(),
                                value,
                                bounds: *bounds,
                            };
                            log::warn!("{}", violation);
                            violations.push(violation);
                        }
                    }
                    FeatureValue::Numeric(value)
                }
                FeatureKind::Categorical { domain } | FeatureKind::BooleanLike { domain } => {
                    // Exact literal match; encoders cannot represent anything else
                    if !domain.iter().any(|d| d == raw_value) {
                        return Err(DeliveryError::UnknownCategory {
                            name: spec.name.clone(),
                            value: raw_value.to_string(),
                        });
                    }
                    FeatureValue::Category(raw_value.to_string())
                }
            };

            values.push((spec.name.clone(), value));
        }

        Ok(InferenceRequest { values, violations })
    }

    /// Lay out a request as a single row in registry column order
    pub fn assemble(&self, request: &InferenceRequest) -> Result<FeatureTable> {
        let mut columns = Vec::with_capacity(self.registry.len());
        let mut row = Vec::with_capacity(self.registry.len());

        for spec in self.registry.list_features() {
            let value = request
                .get(&spec.name)
                .ok_or_else(|| DeliveryError::MissingField(spec.name.clone()))?;
            columns.push(spec.name.clone());
            row.push(value.clone());
        }

        FeatureTable::new(columns, row)
    }
}

fn parse_numeric(name: &str, raw: &str) -> Result<f64> {
    let invalid = || DeliveryError::InvalidNumeric {
        name: name.to_string(),
        value: raw.to_string(),
    };
    let value: f64 = raw.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value)
}
