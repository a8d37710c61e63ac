//! Feature schema and request assembly
//!
//! Converts raw form values into model-ready feature tables.

pub mod catalog;
pub mod request;
pub mod schema;

pub use catalog::DELIVERY_FEATURES;
pub use request::{FeatureTable, FeatureValue, InferenceRequest, InferenceRequestBuilder, RawValues};
pub use schema::{Bounds, FeatureKind, FeatureSpec, SchemaRegistry};
