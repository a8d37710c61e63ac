//! Feed-forward regressor for delivery time
//!
//! Architecture: Input(encoded) → Hidden1 → ReLU
//!                             → Hidden2 → ReLU ...
//!                             → minutes_head(1) → ReLU

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{DeliveryError, Result};

/// Layer sizes of the regressor, stored in the artifact manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressorConfig {
    /// Width of the encoded feature row
    pub input_dim: usize,
    /// Hidden layer widths (e.g., [64, 32] for two layers)
    pub hidden_dims: Vec<usize>,
}

impl RegressorConfig {
    pub fn new(input_dim: usize, hidden_dims: Vec<usize>) -> Self {
        RegressorConfig {
            input_dim,
            hidden_dims,
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron predicting minutes
#[derive(Module, Debug)]
pub struct MlpRegressor<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    head: Linear<B>,
}

impl<B: Backend> MlpRegressor<B> {
    /// Create a regressor with freshly initialized weights
    pub fn new(device: &B::Device, config: &RegressorConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;

        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        MlpRegressor {
            hidden,
            head: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Encoded features [batch, input_dim]
    ///
    /// # Returns
    /// Minutes [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.iter().fold(x, |x, block| block.forward(x));
        // ReLU keeps the delivery time non-negative
        relu(self.head.forward(x))
    }

    /// Predict for a single encoded row
    pub fn predict_row(&self, row: &[f32], device: &B::Device) -> Result<Vec<f64>> {
        let input = Tensor::<B, 1>::from_floats(row, device).reshape([1, row.len()]);
        let output = self.forward(input);

        let values = output
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| DeliveryError::Inference(format!("{:?}", e)))?;

        Ok(values.into_iter().map(f64::from).collect())
    }

    /// Save weights to file (the recorder adds the `.mpk` extension)
    pub fn save(&self, path: &Path) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.clone().into_record(), path.to_path_buf())
            .map_err(|e| DeliveryError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load weights from file
    pub fn load(device: &B::Device, path: &Path, config: &RegressorConfig) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record = recorder
            .load(path.to_path_buf(), device)
            .map_err(|e| DeliveryError::ModelLoad(format!("{}: {}", path.display(), e)))?;

        let model = Self::new(device, config);
        Ok(model.load_record(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_regressor_shape_and_sign() {
        let device = Default::default();
        let config = RegressorConfig::new(8, vec![16, 8]);
        let model = MlpRegressor::<TestBackend>::new(&device, &config);

        let x = Tensor::random([4, 8], burn::tensor::Distribution::Normal(0.0, 1.0), &device);
        let y = model.forward(x);

        assert_eq!(y.dims(), [4, 1]);
        let data = y.to_data();
        for val in data.as_slice::<f32>().unwrap() {
            assert!(*val >= 0.0, "Minutes should be non-negative, got {}", val);
        }
    }

    #[test]
    fn test_no_hidden_layers() {
        let device = Default::default();
        let config = RegressorConfig::new(3, vec![]);
        let model = MlpRegressor::<TestBackend>::new(&device, &config);

        let out = model.predict_row(&[1.0, 2.0, 3.0], &device).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].is_finite());
    }

    #[test]
    fn test_predict_row_is_deterministic() {
        let device = Default::default();
        let config = RegressorConfig::new(4, vec![8]);
        let model = MlpRegressor::<TestBackend>::new(&device, &config);

        let row = [0.5, -1.0, 2.0, 0.0];
        let a = model.predict_row(&row, &device).unwrap();
        let b = model.predict_row(&row, &device).unwrap();
        assert_eq!(a, b);
    }
}
