//! Initialization policies for trainable parameters.

use burn::module::Param;
use burn::nn::Initializer;
use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Initial value policy for a trainable parameter.
///
/// Serialized as `{"class_name": "Ones", "config": {}}` so a layer config record
/// names its initializer the same way for every variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum BetaInitializer {
    /// Every element is 1.
    Ones {},
    /// Every element is 0.
    Zeros {},
    /// Every element is `value`.
    Constant { value: f64 },
    /// Uniform samples in `[minval, maxval)`.
    RandomUniform { minval: f64, maxval: f64 },
    /// Normal samples with the given mean and standard deviation.
    RandomNormal { mean: f64, stddev: f64 },
}

impl Default for BetaInitializer {
    fn default() -> Self {
        BetaInitializer::Ones {}
    }
}

impl BetaInitializer {
    /// Creates an initializer from its short identifier, using default arguments.
    pub fn from_name(name: &str) -> Result<Self, ModelError> {
        match name.to_lowercase().as_str() {
            "ones" => Ok(BetaInitializer::Ones {}),
            "zeros" => Ok(BetaInitializer::Zeros {}),
            "constant" => Ok(BetaInitializer::Constant { value: 0.0 }),
            "random_uniform" | "uniform" => Ok(BetaInitializer::RandomUniform {
                minval: -0.05,
                maxval: 0.05,
            }),
            "random_normal" | "normal" => Ok(BetaInitializer::RandomNormal {
                mean: 0.0,
                stddev: 0.05,
            }),
            _ => Err(ModelError::InvalidInitializer {
                name: name.to_string(),
            }),
        }
    }

    /// Returns the short identifier of this initializer.
    pub fn name(&self) -> &'static str {
        match self {
            BetaInitializer::Ones {} => "ones",
            BetaInitializer::Zeros {} => "zeros",
            BetaInitializer::Constant { .. } => "constant",
            BetaInitializer::RandomUniform { .. } => "random_uniform",
            BetaInitializer::RandomNormal { .. } => "random_normal",
        }
    }

    /// The equivalent Burn initializer.
    pub fn to_burn(&self) -> Initializer {
        match self {
            BetaInitializer::Ones {} => Initializer::Ones,
            BetaInitializer::Zeros {} => Initializer::Zeros,
            BetaInitializer::Constant { value } => Initializer::Constant { value: *value },
            BetaInitializer::RandomUniform { minval, maxval } => Initializer::Uniform {
                min: *minval,
                max: *maxval,
            },
            BetaInitializer::RandomNormal { mean, stddev } => Initializer::Normal {
                mean: *mean,
                std: *stddev,
            },
        }
    }

    /// Creates a parameter of the given shape on `device`.
    pub fn init<B: Backend, const D: usize>(
        &self,
        shape: [usize; D],
        device: &B::Device,
    ) -> Param<Tensor<B, D>> {
        self.to_burn().init(shape, device)
    }
}
