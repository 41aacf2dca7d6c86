//! Masking layer deriving a timestep mask from padded input.

use burn::{
    module::{Ignored, Module},
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::layer::{BaseLayerConfig, Dim, InputSpec, Layer, Mask};
use crate::errors::ModelError;

/// Configuration for a [`Masking`] layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskingConfig {
    #[serde(flatten)]
    pub base: BaseLayerConfig,
    /// Feature value marking padding.
    #[serde(default)]
    pub mask_value: f32,
}

impl MaskingConfig {
    /// Creates a config treating timesteps whose features all equal `mask_value` as padding.
    pub fn new(mask_value: f32) -> Self {
        Self {
            base: BaseLayerConfig::with_prefix("masking"),
            mask_value,
        }
    }

    /// Sets the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    /// Builds the layer for `[batch, seq, features]` inputs.
    pub fn build(&self, input_shape: &[Dim]) -> Result<Masking, ModelError> {
        InputSpec { ndim: 3 }.check_rank(input_shape.len())?;
        log::debug!(
            "Built masking layer '{}' (mask value {})",
            self.base.name,
            self.mask_value
        );
        Ok(Masking {
            mask_value: self.mask_value,
            config: Ignored(self.clone()),
        })
    }
}

/// Marks a timestep valid when any of its features differs from `mask_value`,
/// and zeroes the features of invalid timesteps.
#[derive(Module, Clone, Debug)]
pub struct Masking {
    mask_value: f32,
    config: Ignored<MaskingConfig>,
}

impl Masking {
    /// Computes the `[batch, seq]` validity mask of the input.
    pub fn mask<B: Backend>(&self, input: &Tensor<B, 3>) -> Mask<B> {
        let [batch, seq, _] = input.dims();
        input
            .clone()
            .equal_elem(self.mask_value)
            .bool_not()
            .float()
            .sum_dim(2)
            .reshape([batch, seq])
            .greater_elem(0.0)
    }

    /// Zeroes padded timesteps.
    pub fn forward<B: Backend>(&self, input: Tensor<B, 3>) -> Tensor<B, 3> {
        let mask = self.mask(&input);
        input * mask.float().unsqueeze_dim::<3>(2)
    }

    /// Returns the padding value.
    pub fn mask_value(&self) -> f32 {
        self.mask_value
    }

    /// Returns the layer name.
    pub fn name(&self) -> &str {
        &self.config.0.base.name
    }

    /// Returns a config sufficient to rebuild this layer.
    pub fn get_config(&self) -> MaskingConfig {
        self.config.0.clone()
    }
}

impl<B: Backend> Layer<B, 3, 3> for Masking {
    fn forward_masked(&self, input: Tensor<B, 3>, _mask: Option<Mask<B>>) -> Tensor<B, 3> {
        self.forward(input)
    }

    fn compute_output_shape(&self, input_shape: [Dim; 3]) -> [Dim; 3] {
        input_shape
    }

    fn compute_mask(&self, input: &Tensor<B, 3>, _mask: Option<Mask<B>>) -> Option<Mask<B>> {
        Some(self.mask(input))
    }
}
