//! Model-related error types.

use thiserror::Error;

/// Errors that can occur while building layers, assembling models or training.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model has no layers defined")]
    NoLayers,

    #[error("Model has no input features defined")]
    NoInputBuffer,

    #[error("Model has no sum layer reducing the sequence axis")]
    MissingPooling,

    #[error("Invalid layer order: {message}")]
    InvalidLayerOrder { message: String },

    #[error("Invalid input shape: expected rank {expected}, got rank {actual}")]
    InvalidInputShape { expected: usize, actual: usize },

    #[error("Batch contains no samples")]
    EmptyBatch,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Unknown initializer: {name}")]
    InvalidInitializer { name: String },

    #[error("Unknown layer class: {class_name}")]
    UnknownLayer { class_name: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Training error: {message}")]
    TrainingError { message: String },

    #[error("Invalid activation: {name}")]
    InvalidActivation { name: String },
}
