//! Reference data loading
//!
//! The historical delivery dataset the feature domains are derived from.

pub mod dataset;

pub use dataset::ReferenceDataset;
