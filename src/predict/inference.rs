//! Model inference for predictions

use crate::features::{FeatureTable, InferenceRequest, InferenceRequestBuilder, RawValues, SchemaRegistry};
use crate::model::DeliveryModel;
use crate::{DeliveryError, PredictionResult, Result};

/// Predictor for delivery times
///
/// Holds shared references to the registry and the loaded model; both are
/// built once at startup and never mutated.
pub struct Predictor<'a, M: DeliveryModel + ?Sized> {
    builder: InferenceRequestBuilder<'a>,
    model: &'a M,
}

impl<'a, M: DeliveryModel + ?Sized> Predictor<'a, M> {
    /// Create a new predictor
    pub fn new(registry: &'a SchemaRegistry, model: &'a M) -> Self {
        Predictor {
            builder: InferenceRequestBuilder::new(registry),
            model,
        }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.builder.registry()
    }

    /// Validate raw values into a request without running the model
    pub fn build(&self, raw: &RawValues) -> Result<InferenceRequest> {
        self.builder.build(raw)
    }

    /// Assemble the single-row table the model would receive
    pub fn table(&self, request: &InferenceRequest) -> Result<FeatureTable> {
        self.builder.assemble(request)
    }

    /// Predict a delivery time from raw form values
    pub fn predict(&self, raw: &RawValues) -> Result<PredictionResult> {
        let request = self.build(raw)?;
        self.predict_request(&request)
    }

    /// Predict a delivery time from an already validated request
    pub fn predict_request(&self, request: &InferenceRequest) -> Result<PredictionResult> {
        let table = self.table(request)?;
        let outputs = self.model.predict(&table)?;

        let first = outputs
            .first()
            .copied()
            .ok_or_else(|| DeliveryError::Inference("model returned no prediction".to_string()))?;
        if outputs.len() > 1 {
            log::warn!(
                "Model returned {} values for a single row, using the first",
                outputs.len()
            );
        }

        let result = PredictionResult::from_model_output(first)?;
        log::debug!("Predicted {:.2} minutes", result.minutes);
        Ok(result)
    }
}

/// Format a prediction for display
pub fn format_prediction(pred: &PredictionResult) -> String {
    format!("The Delivery Time is {}", pred)
}
