//! Loss functions for training.

use burn::tensor::{Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

/// Clipping bound keeping `log` finite in the cross entropy.
const BCE_EPSILON: f64 = 1e-7;

/// Supported loss functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Loss {
    /// Mean Squared Error loss.
    #[default]
    Mse,
    /// Binary Cross Entropy loss on probabilities.
    BinaryCrossEntropy,
}

impl Loss {
    /// Computes the mean loss between `[batch, outputs]` predictions and targets.
    pub fn compute<B: Backend>(
        &self,
        predictions: Tensor<B, 2>,
        targets: Tensor<B, 2>,
    ) -> Tensor<B, 1> {
        match self {
            Loss::Mse => {
                let diff = predictions - targets;
                (diff.clone() * diff).mean()
            }
            Loss::BinaryCrossEntropy => {
                // -mean(y * log(p) + (1 - y) * log(1 - p))
                let p = predictions.clamp(BCE_EPSILON, 1.0 - BCE_EPSILON);
                let positive = targets.clone() * p.clone().log();
                let negative = (targets.neg() + 1.0) * (p.neg() + 1.0).log();
                (positive + negative).neg().mean()
            }
        }
    }
}
