//! Sum over the sequence axis that ignores masked timesteps.

use burn::{
    module::{Ignored, Module},
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::layer::{BaseLayerConfig, Dim, InputSpec, Layer, Mask};
use crate::errors::ModelError;

/// Configuration for a [`MaskedSum`] layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskedSumConfig {
    #[serde(flatten)]
    pub base: BaseLayerConfig,
}

impl Default for MaskedSumConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl MaskedSumConfig {
    /// Creates a new MaskedSumConfig.
    pub fn new() -> Self {
        Self {
            base: BaseLayerConfig::with_prefix("sum"),
        }
    }

    /// Sets the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    /// Builds the layer. There are no weights; only the `[batch, seq, features]`
    /// rank is checked.
    pub fn build(&self, input_shape: &[Dim]) -> Result<MaskedSum, ModelError> {
        InputSpec { ndim: 3 }.check_rank(input_shape.len())?;
        log::debug!("Built sum layer '{}'", self.base.name);
        Ok(MaskedSum {
            config: Ignored(self.clone()),
        })
    }
}

/// Reduces `[batch, seq, features]` to `[batch, features]` by summing valid timesteps.
///
/// The mask is consumed here; nothing downstream receives one.
#[derive(Module, Clone, Debug)]
pub struct MaskedSum {
    config: Ignored<MaskedSumConfig>,
}

impl MaskedSum {
    /// Sums over the sequence axis, zeroing masked timesteps first when a mask is given.
    pub fn forward<B: Backend>(&self, input: Tensor<B, 3>, mask: Option<Mask<B>>) -> Tensor<B, 2> {
        match mask {
            Some(mask) => self.forward_weighted(input, mask.float()),
            None => {
                let [batch, _, features] = input.dims();
                input.sum_dim(1).reshape([batch, features])
            }
        }
    }

    /// Sums over the sequence axis with a float `[batch, seq]` mask.
    ///
    /// Each timestep is scaled by its mask value before summing, so a 0/1 mask
    /// matches [`MaskedSum::forward`] and other values weight the timesteps.
    pub fn forward_weighted<B: Backend>(
        &self,
        input: Tensor<B, 3>,
        mask: Tensor<B, 2>,
    ) -> Tensor<B, 2> {
        let [batch, _, features] = input.dims();
        (input * mask.unsqueeze_dim::<3>(2))
            .sum_dim(1)
            .reshape([batch, features])
    }

    /// Returns the layer name.
    pub fn name(&self) -> &str {
        &self.config.0.base.name
    }

    /// Returns a config sufficient to rebuild this layer.
    pub fn get_config(&self) -> MaskedSumConfig {
        self.config.0.clone()
    }
}

impl<B: Backend> Layer<B, 3, 2> for MaskedSum {
    fn forward_masked(&self, input: Tensor<B, 3>, mask: Option<Mask<B>>) -> Tensor<B, 2> {
        self.forward(input, mask)
    }

    fn compute_output_shape(&self, input_shape: [Dim; 3]) -> [Dim; 2] {
        [input_shape[0], input_shape[2]]
    }

    fn compute_mask(&self, _input: &Tensor<B, 3>, _mask: Option<Mask<B>>) -> Option<Mask<B>> {
        None
    }
}
