//! Training configuration for sequence pooling models.

use serde::{Deserialize, Serialize};

use super::Loss;
use crate::errors::ModelError;

/// Hyperparameters for [`train`](super::train).
///
/// Sequences are grouped into mini-batches of `batch_size` and zero-padded to the
/// longest sequence of their batch. With `sort_by_length`, sequences of similar
/// length share a batch so less of each batch is padding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub epochs: usize,
    /// Adam step size.
    pub learning_rate: f64,
    /// Sequences per optimizer step.
    pub batch_size: usize,
    pub loss: Loss,
    /// Group sequences by length before batching.
    pub sort_by_length: bool,
    /// Log the epoch loss every `log_interval` epochs (and on the last one).
    pub log_interval: usize,
    /// Whether to log progress during training.
    pub verbose: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.001,
            batch_size: 16,
            loss: Loss::Mse,
            sort_by_length: false,
            log_interval: 10,
            verbose: true,
        }
    }
}

impl TrainingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn loss(mut self, loss: Loss) -> Self {
        self.loss = loss;
        self
    }

    /// Batches sequences of similar length together.
    pub fn sort_by_length(mut self, sort: bool) -> Self {
        self.sort_by_length = sort;
        self
    }

    pub fn log_interval(mut self, interval: usize) -> Self {
        self.log_interval = interval;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Checks that the configuration can drive a training run.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.batch_size == 0 {
            return Err(ModelError::TrainingError {
                message: "batch size must be at least 1".to_string(),
            });
        }
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(ModelError::TrainingError {
                message: format!("invalid learning rate {}", self.learning_rate),
            });
        }
        if self.log_interval == 0 {
            return Err(ModelError::TrainingError {
                message: "log interval must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Order in which samples are visited when forming mini-batches.
    pub(crate) fn batch_order(&self, lengths: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..lengths.len()).collect();
        if self.sort_by_length {
            order.sort_by_key(|&i| lengths[i]);
        }
        order
    }
}
