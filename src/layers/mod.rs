//! Neural network layer implementations.
//!
//! This module contains the trainable Swish activation, the masked sequence sum,
//! the masking layer that produces timestep masks, dense layers and the shared
//! [`Layer`] contract they implement.

pub mod activation;
pub mod dense;
pub mod initializer;
pub mod layer;
pub mod masked_sum;
pub mod masking;
pub mod registry;
pub mod swish;

pub use activation::Activation;
pub use dense::{Dense, DenseConfig};
pub use initializer::BetaInitializer;
pub use layer::{BaseLayerConfig, Dim, InputSpec, Layer, Mask, combine_masks, mask_from_lengths};
pub use masked_sum::{MaskedSum, MaskedSumConfig};
pub use masking::{Masking, MaskingConfig};
pub use registry::{LayerSpec, custom_objects};
pub use swish::{Swish, SwishConfig};
