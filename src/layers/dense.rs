//! Dense (fully connected) layer implementation.

use crate::errors::ModelError;
use crate::layers::Activation;
use burn::{
    module::{Ignored, Module},
    nn::{Linear, LinearConfig},
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::layer::{BaseLayerConfig, Dim, Layer, Mask};

/// Configuration for a Dense layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseConfig {
    #[serde(flatten)]
    pub base: BaseLayerConfig,
    /// Number of input features.
    pub input_size: usize,
    /// Number of output features.
    pub output_size: usize,
    /// Activation function to apply after the linear transformation.
    #[serde(default)]
    pub activation: Activation,
}

impl DenseConfig {
    /// Creates a new DenseConfig.
    pub fn new(input_size: usize, output_size: usize) -> Self {
        Self {
            base: BaseLayerConfig::with_prefix("dense"),
            input_size,
            output_size,
            activation: Activation::None,
        }
    }

    /// Sets the activation function.
    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    /// Sets the activation function from its identifier, e.g. `"relu"`.
    pub fn with_activation_name(self, name: &str) -> Result<Self, ModelError> {
        let activation = Activation::from_name(name)?;
        Ok(self.with_activation(activation))
    }

    /// Sets the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    /// Builds the layer for inputs of the given shape; the last dimension must be
    /// `input_size` when known.
    pub fn build<B: Backend>(
        &self,
        input_shape: &[Dim],
        device: &B::Device,
    ) -> Result<Dense<B>, ModelError> {
        match input_shape.last() {
            None => {
                return Err(ModelError::InvalidInputShape {
                    expected: 2,
                    actual: 0,
                });
            }
            Some(Some(features)) if *features != self.input_size => {
                return Err(ModelError::ShapeMismatch {
                    expected: self.input_size,
                    actual: *features,
                });
            }
            Some(_) => {}
        }
        Ok(self.init(device))
    }

    /// Initializes the Dense layer with the given device.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Dense<B> {
        let linear = LinearConfig::new(self.input_size, self.output_size).init(device);
        log::debug!(
            "Built dense layer '{}' ({} -> {}, {})",
            self.base.name,
            self.input_size,
            self.output_size,
            self.activation.name()
        );

        Dense {
            linear,
            config: Ignored(self.clone()),
        }
    }
}

/// A dense (fully connected) layer with optional activation.
///
/// It performs: output = activation(input @ weights + bias). Applied to a
/// `[batch, seq, features]` tensor it acts on every timestep independently.
#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    /// The underlying linear transformation.
    linear: Linear<B>,
    /// The configuration this layer was built from.
    config: Ignored<DenseConfig>,
}

impl<B: Backend> Dense<B> {
    /// Performs the forward pass.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let output = self.linear.forward(input);
        self.config.0.activation.apply(output)
    }

    /// Returns the input size of this layer.
    pub fn input_size(&self) -> usize {
        self.config.0.input_size
    }

    /// Returns the output size of this layer.
    pub fn output_size(&self) -> usize {
        self.config.0.output_size
    }

    /// Returns the activation function.
    pub fn activation(&self) -> Activation {
        self.config.0.activation
    }

    /// Returns the layer name.
    pub fn name(&self) -> &str {
        &self.config.0.base.name
    }

    /// Returns a config sufficient to rebuild an equivalent, untrained layer.
    pub fn get_config(&self) -> DenseConfig {
        self.config.0.clone()
    }
}

impl<B: Backend, const D: usize> Layer<B, D, D> for Dense<B> {
    fn forward_masked(&self, input: Tensor<B, D>, _mask: Option<Mask<B>>) -> Tensor<B, D> {
        self.forward(input)
    }

    fn compute_output_shape(&self, input_shape: [Dim; D]) -> [Dim; D] {
        let mut output_shape = input_shape;
        output_shape[D - 1] = Some(self.output_size());
        output_shape
    }

    fn compute_mask(&self, _input: &Tensor<B, D>, mask: Option<Mask<B>>) -> Option<Mask<B>> {
        mask
    }
}
