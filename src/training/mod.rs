//! Training utilities for sequence pooling models.
//!
//! This module provides training functionality including:
//! - Loss functions (MSE, Binary Cross Entropy)
//! - Training configuration
//! - Padding and masking of variable-length sequences
//! - Training loop with Adam optimizer

mod batch;
mod config;
mod loss;
mod trainer;

pub use batch::{SequenceBatch, targets_to_tensor};
pub use config::TrainingConfig;
pub use loss::Loss;
pub use trainer::{TrainingResult, train};
