//! Prediction and inference
//!
//! Validate form input, run the loaded model and present the result.

pub mod form;
pub mod inference;

pub use form::{run_form, FormSummary};
pub use inference::{format_prediction, Predictor};
