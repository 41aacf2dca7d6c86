//! Padding of variable-length sequences into masked batches.

use burn::tensor::{Tensor, backend::Backend};

use crate::errors::ModelError;
use crate::layers::{Mask, mask_from_lengths};

/// A zero-padded `[batch, seq, features]` tensor with its validity mask.
#[derive(Debug, Clone)]
pub struct SequenceBatch<B: Backend> {
    /// Padded inputs.
    pub inputs: Tensor<B, 3>,
    /// `true` for real timesteps, `false` for padding.
    pub mask: Mask<B>,
    /// Number of real timesteps per sequence.
    pub lengths: Vec<usize>,
}

impl<B: Backend> SequenceBatch<B> {
    /// Pads `sequences` (each a list of timesteps of `feature_size` values) to the
    /// longest sequence.
    pub fn from_sequences(
        sequences: &[Vec<Vec<f32>>],
        feature_size: usize,
        device: &B::Device,
    ) -> Result<Self, ModelError> {
        if sequences.is_empty() {
            return Err(ModelError::EmptyBatch);
        }

        let lengths: Vec<usize> = sequences.iter().map(|s| s.len()).collect();
        // An all-empty batch still needs one (padded) timestep.
        let seq_len = lengths.iter().copied().max().unwrap_or(0).max(1);

        let mut data = vec![0.0f32; sequences.len() * seq_len * feature_size];
        for (i, sequence) in sequences.iter().enumerate() {
            for (t, step) in sequence.iter().enumerate() {
                if step.len() != feature_size {
                    return Err(ModelError::ShapeMismatch {
                        expected: feature_size,
                        actual: step.len(),
                    });
                }
                let offset = (i * seq_len + t) * feature_size;
                data[offset..offset + feature_size].copy_from_slice(step);
            }
        }

        let inputs = Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([
            sequences.len(),
            seq_len,
            feature_size,
        ]);
        let mask = mask_from_lengths(&lengths, seq_len, device);

        Ok(Self {
            inputs,
            mask,
            lengths,
        })
    }

    /// Number of sequences in the batch.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Returns true if the batch holds no sequences.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }
}

/// Stacks per-sample target vectors into a `[batch, outputs]` tensor.
pub fn targets_to_tensor<B: Backend>(
    targets: &[Vec<f32>],
    output_size: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>, ModelError> {
    if targets.is_empty() {
        return Err(ModelError::EmptyBatch);
    }
    if let Some(bad) = targets.iter().find(|t| t.len() != output_size) {
        return Err(ModelError::ShapeMismatch {
            expected: output_size,
            actual: bad.len(),
        });
    }

    let data: Vec<f32> = targets.iter().flat_map(|v| v.iter().copied()).collect();
    Ok(Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([targets.len(), output_size]))
}
