//! # sumnet
//!
//! Custom layers for sequence pooling networks built on the Burn framework.
//!
//! The crate provides two layers and the model plumbing around them:
//!
//! - **Swish**: `x * sigmoid(beta * x)` with a single trainable scalar `beta`
//!   shared across the whole input.
//! - **Sum**: reduces `[batch, seq, features]` to `[batch, features]` by summing over
//!   the sequence axis, skipping timesteps marked invalid by a mask.
//!
//! Layers are configured through serializable config records
//! (`{"class_name": "Swish", "config": {...}}`), built for an input shape, and
//! composed into a [`ModelGraph`] that can be trained with Adam.
//!
//! ## Example
//!
//! ```
//! use sumnet::prelude::*;
//! use burn::backend::NdArray;
//! use burn::tensor::Tensor;
//!
//! type Backend = NdArray;
//!
//! let device = <Backend as burn::tensor::backend::Backend>::Device::default();
//!
//! // Per-timestep encoder, masked sum over the sequence, then a dense head.
//! let model: ModelGraph<Backend> = ModelGraphConfig::with_feature_size(3)
//!     .masking(0.0)
//!     .dense(8, Activation::None)
//!     .swish()
//!     .sum()
//!     .dense(1, Activation::Sigmoid)
//!     .build(&device)
//!     .expect("Failed to build model");
//!
//! let output = model.forward(Tensor::<Backend, 3>::ones([2, 5, 3], &device));
//! assert_eq!(output.dims(), [2, 1]);
//!
//! // The configuration round-trips through JSON.
//! let json = model.config().to_json().unwrap();
//! assert!(json.contains("Swish"));
//! ```

pub mod errors;
pub mod layers;
pub mod model_graph;
pub mod training;

// Re-exports for convenience
pub use errors::ModelError;
pub use layers::{MaskedSum, MaskedSumConfig, Swish, SwishConfig};
pub use model_graph::{ModelGraph, ModelGraphConfig};
pub use training::{Loss, TrainingConfig};

/// Backend type alias for WGPU with autodiff support.
pub type Backend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// Backend type for inference (no autodiff).
pub type InferenceBackend = burn::backend::Wgpu;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::errors::ModelError;
    pub use crate::layers::{
        Activation, BetaInitializer, Layer, MaskedSum, MaskedSumConfig, Masking, MaskingConfig,
        Swish, SwishConfig,
    };
    pub use crate::model_graph::{ModelGraph, ModelGraphConfig};
    pub use crate::training::{Loss, TrainingConfig, train};
    pub use crate::{Backend, InferenceBackend};
}
