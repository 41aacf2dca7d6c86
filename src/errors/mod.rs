//! Error types for layer construction, model assembly and training.

mod model_error;

pub use model_error::ModelError;
