//! Training loop implementation.

use super::TrainingConfig;
use super::batch::{SequenceBatch, targets_to_tensor};
use crate::errors::ModelError;
use crate::model_graph::ModelGraph;
use burn::{
    optim::{AdamConfig, GradientsParams, Optimizer},
    tensor::{ElementConversion, Tensor, backend::AutodiffBackend},
};

/// Training result containing the trained model and metrics.
#[derive(Debug)]
pub struct TrainingResult<B: AutodiffBackend> {
    /// The trained model.
    pub model: ModelGraph<B>,
    /// Mean loss per epoch.
    pub loss_history: Vec<f32>,
}

/// Trains a model on variable-length sequences using the Adam optimizer.
///
/// Each sequence in `inputs` is a list of timesteps with `model.feature_size()`
/// values; sequences are padded per mini-batch and padding is masked out of the sum.
pub fn train<B: AutodiffBackend>(
    model: ModelGraph<B>,
    inputs: &[Vec<Vec<f32>>],
    targets: &[Vec<f32>],
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingResult<B>, ModelError> {
    config.validate()?;

    if inputs.is_empty() {
        return Err(ModelError::TrainingError {
            message: "no training samples".to_string(),
        });
    }
    if inputs.len() != targets.len() {
        return Err(ModelError::TrainingError {
            message: format!(
                "{} input sequences but {} targets",
                inputs.len(),
                targets.len()
            ),
        });
    }

    let lengths: Vec<usize> = inputs.iter().map(Vec::len).collect();
    let order = config.batch_order(&lengths);

    let batches: Vec<(SequenceBatch<B>, Tensor<B, 2>)> = order
        .chunks(config.batch_size)
        .map(|indices| {
            let x: Vec<Vec<Vec<f32>>> = indices.iter().map(|&i| inputs[i].clone()).collect();
            let y: Vec<Vec<f32>> = indices.iter().map(|&i| targets[i].clone()).collect();
            let batch = SequenceBatch::from_sequences(&x, model.feature_size(), device)?;
            let target = targets_to_tensor(&y, model.output_size(), device)?;
            Ok((batch, target))
        })
        .collect::<Result<_, ModelError>>()?;

    log::debug!(
        "Training on {} sequences in {} batches for {} epochs",
        inputs.len(),
        batches.len(),
        config.epochs
    );

    // Initialize optimizer
    let optimizer_config = AdamConfig::new();
    let mut optimizer = optimizer_config.init();

    let mut current_model = model;
    let mut loss_history = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        let mut epoch_loss = 0.0f32;

        for (batch, target) in &batches {
            // Forward pass
            let predictions =
                current_model.forward_masked(batch.inputs.clone(), Some(batch.mask.clone()));

            // Compute loss
            let loss = config.loss.compute(predictions, target.clone());
            let loss_value: f32 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value * batch.len() as f32;

            // Backward pass
            let grads = loss.backward();
            let grads_params = GradientsParams::from_grads(grads, &current_model);

            // Update model parameters
            current_model = optimizer.step(config.learning_rate, current_model, grads_params);
        }

        let mean_loss = epoch_loss / inputs.len() as f32;
        loss_history.push(mean_loss);

        if config.verbose && (epoch % config.log_interval == 0 || epoch + 1 == config.epochs) {
            log::info!(
                "Epoch {}/{}: loss = {:.6}",
                epoch + 1,
                config.epochs,
                mean_loss
            );
        }
    }

    Ok(TrainingResult {
        model: current_model,
        loss_history,
    })
}
