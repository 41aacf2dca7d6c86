//! The layer contract shared by every custom layer.
//!
//! A layer's unbuilt state is its config type (`SwishConfig`, `MaskedSumConfig`, ...),
//! and its built state is the Burn module returned by the config's `build` method.
//! Built layers implement [`Layer`], which covers masked application, output shape
//! declaration and mask propagation.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use burn::tensor::{Bool, Tensor, backend::Backend};
use serde::{Deserialize, Serialize};

use crate::errors::ModelError;

/// Per-timestep validity mask with shape `[batch, seq]`. `true` marks a valid position.
pub type Mask<B> = Tensor<B, 2, Bool>;

/// A symbolic dimension. `None` stands for a dimension unknown until execution,
/// typically the batch size.
pub type Dim = Option<usize>;

/// The capability set every built layer provides to a model.
///
/// `D_IN` and `D_OUT` are the input and output tensor ranks.
pub trait Layer<B: Backend, const D_IN: usize, const D_OUT: usize> {
    /// Applies the layer, optionally receiving the mask produced upstream.
    fn forward_masked(&self, input: Tensor<B, D_IN>, mask: Option<Mask<B>>) -> Tensor<B, D_OUT>;

    /// Declares the output shape for a given input shape without executing the layer.
    fn compute_output_shape(&self, input_shape: [Dim; D_IN]) -> [Dim; D_OUT];

    /// Returns the mask that downstream layers receive.
    fn compute_mask(&self, input: &Tensor<B, D_IN>, mask: Option<Mask<B>>) -> Option<Mask<B>>;
}

/// Input rank recorded when a layer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub ndim: usize,
}

impl InputSpec {
    /// Records the rank of the given build shape.
    pub fn from_shape(input_shape: &[Dim]) -> Self {
        Self {
            ndim: input_shape.len(),
        }
    }

    /// Checks that a shape of the given rank is acceptable.
    pub fn check_rank(&self, rank: usize) -> Result<(), ModelError> {
        if rank != self.ndim {
            return Err(ModelError::InvalidInputShape {
                expected: self.ndim,
                actual: rank,
            });
        }
        Ok(())
    }
}

/// Configuration fields common to all layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayerConfig {
    /// Unique layer name.
    pub name: String,
    /// Whether the layer's weights take part in training.
    #[serde(default = "default_trainable")]
    pub trainable: bool,
    /// Floating point type of the layer's computations.
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_trainable() -> bool {
    true
}

fn default_dtype() -> String {
    "float32".to_string()
}

impl BaseLayerConfig {
    /// Creates base fields with a fresh name derived from `prefix`.
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            name: unique_name(prefix),
            trainable: default_trainable(),
            dtype: default_dtype(),
        }
    }
}

/// Global per-prefix counters used to generate unique layer names.
static NAME_COUNTERS: OnceLock<Mutex<HashMap<String, usize>>> = OnceLock::new();

/// Generates a unique layer name: `prefix`, then `prefix_1`, `prefix_2`, ...
pub fn unique_name(prefix: &str) -> String {
    let counters = NAME_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()));
    let mut counters = counters.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = counters.entry(prefix.to_string()).or_insert(0);
    let name = if *count == 0 {
        prefix.to_string()
    } else {
        format!("{}_{}", prefix, count)
    };
    *count += 1;
    name
}

/// Logical AND of two optional masks.
pub fn combine_masks<B: Backend>(a: Option<Mask<B>>, b: Option<Mask<B>>) -> Option<Mask<B>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.float().mul(b.float()).greater_elem(0.0)),
        (Some(mask), None) | (None, Some(mask)) => Some(mask),
        (None, None) => None,
    }
}

/// Builds a `[batch, seq_len]` mask marking the first `lengths[i]` positions of row `i` as valid.
pub fn mask_from_lengths<B: Backend>(
    lengths: &[usize],
    seq_len: usize,
    device: &B::Device,
) -> Mask<B> {
    let values: Vec<f32> = lengths
        .iter()
        .flat_map(|&len| (0..seq_len).map(move |t| if t < len { 1.0 } else { 0.0 }))
        .collect();
    Tensor::<B, 1>::from_floats(values.as_slice(), device)
        .reshape([lengths.len(), seq_len])
        .greater_elem(0.5)
}
