//! Swish activation with a trainable scalar `beta`.
//!
//! Computes `x * sigmoid(beta * x)` elementwise (<https://arxiv.org/abs/1710.05941>).
//! A single scalar `beta` is shared across every element of the input; it is not a
//! per-channel parameter.

use burn::{
    module::{Ignored, Module, Param},
    tensor::{ElementConversion, Tensor, activation::sigmoid, backend::Backend},
};
use serde::{Deserialize, Serialize};

use super::initializer::BetaInitializer;
use super::layer::{BaseLayerConfig, Dim, InputSpec, Layer, Mask};
use crate::errors::ModelError;

/// Configuration for a [`Swish`] layer.
///
/// This is the unbuilt layer: [`SwishConfig::build`] allocates `beta` and returns the
/// built module.
///
/// The base `trainable` flag always mirrors `trainable_beta`, including for records
/// that set only one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SwishConfigRecord")]
pub struct SwishConfig {
    #[serde(flatten)]
    pub base: BaseLayerConfig,
    /// Whether `beta` is updated during training.
    pub trainable_beta: bool,
    /// Initial value policy for `beta`.
    pub beta_initializer: BetaInitializer,
}

/// Deserialized form of a [`SwishConfig`] record before the flags are reconciled.
#[derive(Deserialize)]
struct SwishConfigRecord {
    #[serde(flatten)]
    base: BaseLayerConfig,
    #[serde(default = "default_trainable_beta")]
    trainable_beta: bool,
    #[serde(default)]
    beta_initializer: BetaInitializer,
}

impl From<SwishConfigRecord> for SwishConfig {
    fn from(record: SwishConfigRecord) -> Self {
        let mut base = record.base;
        base.trainable = record.trainable_beta;
        Self {
            base,
            trainable_beta: record.trainable_beta,
            beta_initializer: record.beta_initializer,
        }
    }
}

fn default_trainable_beta() -> bool {
    true
}

impl Default for SwishConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SwishConfig {
    /// Creates a config with a trainable `beta` initialized to ones.
    pub fn new() -> Self {
        Self {
            base: BaseLayerConfig::with_prefix("swish"),
            trainable_beta: true,
            beta_initializer: BetaInitializer::default(),
        }
    }

    /// Sets whether `beta` is trainable. The layer's `trainable` flag follows it.
    pub fn with_trainable_beta(mut self, trainable_beta: bool) -> Self {
        self.trainable_beta = trainable_beta;
        self.base.trainable = trainable_beta;
        self
    }

    /// Sets the initializer for `beta`.
    pub fn with_beta_initializer(mut self, initializer: BetaInitializer) -> Self {
        self.beta_initializer = initializer;
        self
    }

    /// Sets the initializer for `beta` from its short identifier, e.g. `"ones"`.
    pub fn with_beta_initializer_name(self, name: &str) -> Result<Self, ModelError> {
        let initializer = BetaInitializer::from_name(name)?;
        Ok(self.with_beta_initializer(initializer))
    }

    /// Sets the layer name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.base.name = name.into();
        self
    }

    /// Builds the layer for inputs of the given shape.
    ///
    /// Allocates `beta` with shape `[1]` and records the input rank.
    pub fn build<B: Backend>(
        &self,
        input_shape: &[Dim],
        device: &B::Device,
    ) -> Result<Swish<B>, ModelError> {
        if input_shape.is_empty() {
            return Err(ModelError::InvalidInputShape {
                expected: 1,
                actual: 0,
            });
        }

        let input_spec = InputSpec::from_shape(input_shape);
        let beta = self
            .beta_initializer
            .init::<B, 1>([1], device)
            .set_require_grad(self.trainable_beta);

        log::debug!(
            "Built swish layer '{}' (rank {}, beta initializer {}, trainable {})",
            self.base.name,
            input_spec.ndim,
            self.beta_initializer.name(),
            self.trainable_beta
        );

        Ok(Swish {
            beta,
            input_ndim: input_spec.ndim,
            config: Ignored(self.clone()),
        })
    }

    /// Serializes this config into a flat record of base and layer fields.
    pub fn to_record(&self) -> Result<serde_json::Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Reconstructs a config from a record produced by [`SwishConfig::to_record`].
    pub fn from_record(record: serde_json::Value) -> Result<Self, ModelError> {
        Ok(serde_json::from_value(record)?)
    }
}

/// Swish activation layer with one trainable scalar.
#[derive(Module, Debug)]
pub struct Swish<B: Backend> {
    /// The scalar `beta`, shape `[1]`.
    beta: Param<Tensor<B, 1>>,
    /// Rank of the inputs this layer was built for.
    input_ndim: usize,
    /// The configuration this layer was built from.
    config: Ignored<SwishConfig>,
}

impl<B: Backend> Swish<B> {
    /// Applies `input * sigmoid(beta * input)`.
    ///
    /// # Panics
    ///
    /// Panics if the input rank differs from the rank the layer was built for.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        assert_eq!(
            D, self.input_ndim,
            "Swish layer '{}' was built for rank {} inputs",
            self.config.0.base.name, self.input_ndim
        );
        let beta = self.beta.val().unsqueeze::<D>();
        input.clone() * sigmoid(input * beta)
    }

    /// Returns the current value of `beta`.
    pub fn beta(&self) -> f32 {
        self.beta.val().into_scalar().elem()
    }

    /// Returns the rank of the inputs this layer accepts.
    pub fn input_spec(&self) -> InputSpec {
        InputSpec {
            ndim: self.input_ndim,
        }
    }

    /// Returns whether `beta` is trainable.
    pub fn trainable_beta(&self) -> bool {
        self.config.0.trainable_beta
    }

    /// Returns the layer name.
    pub fn name(&self) -> &str {
        &self.config.0.base.name
    }

    /// Returns a config sufficient to rebuild an equivalent, untrained layer.
    pub fn get_config(&self) -> SwishConfig {
        self.config.0.clone()
    }
}

impl<B: Backend, const D: usize> Layer<B, D, D> for Swish<B> {
    fn forward_masked(&self, input: Tensor<B, D>, _mask: Option<Mask<B>>) -> Tensor<B, D> {
        self.forward(input)
    }

    fn compute_output_shape(&self, input_shape: [Dim; D]) -> [Dim; D] {
        input_shape
    }

    fn compute_mask(&self, _input: &Tensor<B, D>, mask: Option<Mask<B>>) -> Option<Mask<B>> {
        mask
    }
}
