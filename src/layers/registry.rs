//! Registration of layer classes for config-based reconstruction.

use serde::{Deserialize, Serialize};

use super::dense::DenseConfig;
use super::masked_sum::MaskedSumConfig;
use super::masking::MaskingConfig;
use super::swish::SwishConfig;
use crate::errors::ModelError;

/// Names of the registered layer classes.
const CUSTOM_OBJECTS: [&str; 4] = ["Swish", "Sum", "Masking", "Dense"];

/// A serialized layer: `{"class_name": "Swish", "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class_name", content = "config")]
pub enum LayerSpec {
    Swish(SwishConfig),
    Sum(MaskedSumConfig),
    Masking(MaskingConfig),
    Dense(DenseConfig),
}

impl LayerSpec {
    /// Returns the registered class name of this layer.
    pub fn class_name(&self) -> &'static str {
        match self {
            LayerSpec::Swish(_) => "Swish",
            LayerSpec::Sum(_) => "Sum",
            LayerSpec::Masking(_) => "Masking",
            LayerSpec::Dense(_) => "Dense",
        }
    }

    /// Returns the layer name.
    pub fn name(&self) -> &str {
        match self {
            LayerSpec::Swish(config) => &config.base.name,
            LayerSpec::Sum(config) => &config.base.name,
            LayerSpec::Masking(config) => &config.base.name,
            LayerSpec::Dense(config) => &config.base.name,
        }
    }

    /// Parses a layer from its `class_name`/`config` record.
    ///
    /// Unregistered class names are reported as [`ModelError::UnknownLayer`].
    pub fn from_value(value: serde_json::Value) -> Result<Self, ModelError> {
        let class_name = value
            .get("class_name")
            .and_then(|name| name.as_str())
            .unwrap_or_default();
        if !is_registered(class_name) {
            return Err(ModelError::UnknownLayer {
                class_name: class_name.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes this layer into its `class_name`/`config` record.
    pub fn to_value(&self) -> Result<serde_json::Value, ModelError> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Returns the class names that can be reconstructed from config records.
pub fn custom_objects() -> &'static [&'static str] {
    &CUSTOM_OBJECTS
}

/// Returns whether `class_name` is a registered layer class.
pub fn is_registered(class_name: &str) -> bool {
    CUSTOM_OBJECTS.contains(&class_name)
}
