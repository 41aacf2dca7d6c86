//! ModelGraph - a sequence pooling network built from the custom layers.
//!
//! A model reads `[batch, seq, features]` sequences and runs, in order:
//! an optional [`Masking`] layer, per-timestep dense/Swish blocks, one
//! [`MaskedSum`] collapsing the sequence axis, and a head of dense/Swish blocks
//! on the pooled `[batch, features]` representation.

use crate::errors::ModelError;
use crate::layers::{
    Activation, Dense, DenseConfig, Dim, Layer, LayerSpec, Mask, MaskedSum, MaskedSumConfig,
    Masking, MaskingConfig, Swish, SwishConfig, combine_masks,
};
use crate::training::SequenceBatch;
use burn::{
    module::Module,
    tensor::{Tensor, backend::Backend},
};
use serde::{Deserialize, Serialize};

/// Configuration for building a ModelGraph: the input features and the ordered layer list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelGraphConfig {
    /// Names of the per-timestep input features.
    pub features: Vec<String>,
    /// Layers in application order.
    pub layers: Vec<LayerSpec>,
}

impl ModelGraphConfig {
    /// Creates a new ModelGraphConfig with the specified features.
    pub fn new(features: Vec<String>) -> Self {
        Self {
            features,
            layers: Vec::new(),
        }
    }

    /// Creates a ModelGraphConfig with numbered features.
    pub fn with_feature_size(size: usize) -> Self {
        let features = (0..size).map(|i| format!("feature_{}", i)).collect();
        Self::new(features)
    }

    /// Width of the tensor produced by the layers added so far.
    fn current_width(&self) -> usize {
        self.layers
            .iter()
            .rev()
            .find_map(|layer| match layer {
                LayerSpec::Dense(config) => Some(config.output_size),
                _ => None,
            })
            .unwrap_or(self.features.len())
    }

    /// Adds a masking layer treating timesteps equal to `mask_value` as padding.
    pub fn masking(mut self, mask_value: f32) -> Self {
        self.layers
            .push(LayerSpec::Masking(MaskingConfig::new(mask_value)));
        self
    }

    /// Adds a dense layer to the configuration.
    pub fn dense(mut self, output_size: usize, activation: Activation) -> Self {
        let input_size = self.current_width();
        self.layers.push(LayerSpec::Dense(
            DenseConfig::new(input_size, output_size).with_activation(activation),
        ));
        self
    }

    /// Adds a dense layer whose activation is given by identifier, e.g. `"relu"`.
    pub fn dense_named(self, output_size: usize, activation: &str) -> Result<Self, ModelError> {
        Ok(self.dense(output_size, Activation::from_name(activation)?))
    }

    /// Adds a Swish activation with a trainable `beta` initialized to ones.
    pub fn swish(self) -> Self {
        self.swish_with(SwishConfig::new())
    }

    /// Adds a Swish activation with the given configuration.
    pub fn swish_with(mut self, config: SwishConfig) -> Self {
        self.layers.push(LayerSpec::Swish(config));
        self
    }

    /// Adds the sum over the sequence axis.
    pub fn sum(mut self) -> Self {
        self.layers.push(LayerSpec::Sum(MaskedSumConfig::new()));
        self
    }

    /// Serializes the configuration to JSON.
    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses a configuration produced by [`ModelGraphConfig::to_json`].
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        #[derive(Deserialize)]
        struct RawConfig {
            features: Vec<String>,
            #[serde(default)]
            layers: Vec<serde_json::Value>,
        }

        let raw: RawConfig = serde_json::from_str(json)?;
        let layers = raw
            .layers
            .into_iter()
            .map(LayerSpec::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            features: raw.features,
            layers,
        })
    }

    /// Builds the ModelGraph with the given device.
    pub fn build<B: Backend>(&self, device: &B::Device) -> Result<ModelGraph<B>, ModelError> {
        if self.features.is_empty() {
            return Err(ModelError::NoInputBuffer);
        }

        if self.layers.is_empty() {
            return Err(ModelError::NoLayers);
        }

        let mut shape: Vec<Dim> = vec![None, None, Some(self.features.len())];
        let mut masking = None;
        let mut encoder: Vec<Block<B>> = Vec::new();
        let mut pooling = None;
        let mut head: Vec<Block<B>> = Vec::new();

        for (index, spec) in self.layers.iter().enumerate() {
            let blocks = if pooling.is_some() {
                &mut head
            } else {
                &mut encoder
            };

            match spec {
                LayerSpec::Masking(config) => {
                    if index != 0 {
                        return Err(ModelError::InvalidLayerOrder {
                            message: format!(
                                "masking layer '{}' must come first",
                                config.base.name
                            ),
                        });
                    }
                    masking = Some(config.build(&shape)?);
                }
                LayerSpec::Dense(config) => {
                    let dense = config.build(&shape, device)?;
                    if let Some(last) = shape.last_mut() {
                        *last = Some(config.output_size);
                    }
                    blocks.push(Block {
                        dense: Some(dense),
                        swish: None,
                    });
                }
                LayerSpec::Swish(config) => {
                    let swish = config.build(&shape, device)?;
                    match blocks.last_mut() {
                        Some(block) if block.swish.is_none() => block.swish = Some(swish),
                        _ => blocks.push(Block {
                            dense: None,
                            swish: Some(swish),
                        }),
                    }
                }
                LayerSpec::Sum(config) => {
                    if pooling.is_some() {
                        return Err(ModelError::InvalidLayerOrder {
                            message: format!(
                                "sum layer '{}' follows another sum layer",
                                config.base.name
                            ),
                        });
                    }
                    pooling = Some(config.build(&shape)?);
                    shape = vec![shape[0], shape[2]];
                }
            }
        }

        let pooling = pooling.ok_or(ModelError::MissingPooling)?;
        let output_size = shape.last().copied().flatten().unwrap_or(0);

        log::debug!(
            "Built model with {} features, {} sequence blocks, {} head blocks, {} outputs",
            self.features.len(),
            encoder.len(),
            head.len(),
            output_size
        );

        Ok(ModelGraph {
            features: self.features.clone(),
            masking,
            encoder,
            pooling,
            head,
            output_size,
        })
    }
}

/// A dense layer followed by an optional Swish, or a standalone Swish.
#[derive(Module, Debug)]
pub struct Block<B: Backend> {
    dense: Option<Dense<B>>,
    swish: Option<Swish<B>>,
}

impl<B: Backend, const D: usize> Layer<B, D, D> for Block<B> {
    fn forward_masked(&self, input: Tensor<B, D>, mask: Option<Mask<B>>) -> Tensor<B, D> {
        let x = match &self.dense {
            Some(dense) => dense.forward_masked(input, mask.clone()),
            None => input,
        };
        match &self.swish {
            Some(swish) => swish.forward_masked(x, mask),
            None => x,
        }
    }

    fn compute_output_shape(&self, input_shape: [Dim; D]) -> [Dim; D] {
        match &self.dense {
            Some(dense) => dense.compute_output_shape(input_shape),
            None => input_shape,
        }
    }

    fn compute_mask(&self, _input: &Tensor<B, D>, mask: Option<Mask<B>>) -> Option<Mask<B>> {
        mask
    }
}

impl<B: Backend> Block<B> {
    fn specs(&self) -> impl Iterator<Item = LayerSpec> + '_ {
        let dense = self
            .dense
            .as_ref()
            .map(|dense| LayerSpec::Dense(dense.get_config()));
        let swish = self
            .swish
            .as_ref()
            .map(|swish| LayerSpec::Swish(swish.get_config()));
        dense.into_iter().chain(swish)
    }
}

/// A sequence pooling network: masking, per-timestep blocks, masked sum, head.
#[derive(Module, Debug)]
pub struct ModelGraph<B: Backend> {
    /// Names of input features (stored as constant).
    features: Vec<String>,
    masking: Option<Masking>,
    encoder: Vec<Block<B>>,
    pooling: MaskedSum,
    head: Vec<Block<B>>,
    output_size: usize,
}

impl<B: Backend> ModelGraph<B> {
    /// Performs a forward pass over unmasked sequences.
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        self.forward_masked(input, None)
    }

    /// Performs a forward pass; `mask` marks valid timesteps and is combined with the
    /// mask derived by the masking layer, if any.
    pub fn forward_masked(&self, input: Tensor<B, 3>, mask: Option<Mask<B>>) -> Tensor<B, 2> {
        let (mut x, mut mask) = match &self.masking {
            Some(masking) => {
                let derived = masking.compute_mask(&input, None);
                (masking.forward_masked(input, None), combine_masks(mask, derived))
            }
            None => (input, mask),
        };

        for block in &self.encoder {
            let next_mask = block.compute_mask(&x, mask.clone());
            x = block.forward_masked(x, mask);
            mask = next_mask;
        }

        let mut pooled = self.pooling.forward_masked(x, mask);
        for block in &self.head {
            pooled = block.forward_masked(pooled, None);
        }
        pooled
    }

    /// Runs the model on variable-length sequences, padding and masking them.
    pub fn predict(
        &self,
        sequences: &[Vec<Vec<f32>>],
        device: &B::Device,
    ) -> Result<Vec<Vec<f32>>, ModelError> {
        let batch = SequenceBatch::<B>::from_sequences(sequences, self.feature_size(), device)?;
        let output = self.forward_masked(batch.inputs, Some(batch.mask));
        let [rows, cols] = output.dims();
        let flat: Vec<f32> = output
            .to_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|err| ModelError::TrainingError {
                message: format!("Failed to read model output: {:?}", err),
            })?;

        Ok((0..rows)
            .map(|r| flat[r * cols..(r + 1) * cols].to_vec())
            .collect())
    }

    /// Declares the output shape for the given input shape.
    pub fn compute_output_shape(&self, input_shape: [Dim; 3]) -> [Dim; 2] {
        let mut shape = input_shape;
        for block in &self.encoder {
            shape = block.compute_output_shape(shape);
        }
        let mut pooled = <MaskedSum as Layer<B, 3, 2>>::compute_output_shape(&self.pooling, shape);
        for block in &self.head {
            pooled = block.compute_output_shape(pooled);
        }
        pooled
    }

    /// Returns the Swish layers in application order.
    pub fn swish_layers(&self) -> Vec<&Swish<B>> {
        self.encoder
            .iter()
            .chain(self.head.iter())
            .filter_map(|block| block.swish.as_ref())
            .collect()
    }

    /// Returns a configuration that rebuilds an equivalent, untrained model.
    pub fn config(&self) -> ModelGraphConfig {
        let mut layers = Vec::new();
        if let Some(masking) = &self.masking {
            layers.push(LayerSpec::Masking(masking.get_config()));
        }
        layers.extend(self.encoder.iter().flat_map(|block| block.specs()));
        layers.push(LayerSpec::Sum(self.pooling.get_config()));
        layers.extend(self.head.iter().flat_map(|block| block.specs()));

        ModelGraphConfig {
            features: self.features.clone(),
            layers,
        }
    }

    /// Returns the input feature names.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Returns the number of input features.
    pub fn feature_size(&self) -> usize {
        self.features.len()
    }

    /// Returns the output size of the model.
    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns the number of layers.
    pub fn num_layers(&self) -> usize {
        let blocks: usize = self
            .encoder
            .iter()
            .chain(self.head.iter())
            .map(|block| block.dense.iter().count() + block.swish.iter().count())
            .sum();
        blocks + 1 + usize::from(self.masking.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::BetaInitializer;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn pooling_config() -> ModelGraphConfig {
        ModelGraphConfig::with_feature_size(3)
            .masking(0.0)
            .dense(8, Activation::None)
            .swish()
            .sum()
            .dense(4, Activation::None)
            .swish()
            .dense(1, Activation::Sigmoid)
    }

    #[test]
    fn test_model_graph_config_creation() {
        let config = pooling_config();

        assert_eq!(config.features.len(), 3);
        assert_eq!(config.layers.len(), 7);
        assert_eq!(config.current_width(), 1);
    }

    #[test]
    fn test_model_graph_build() {
        let device = <TestBackend as Backend>::Device::default();
        let model: ModelGraph<TestBackend> = pooling_config()
            .build(&device)
            .expect("Failed to build model");

        assert_eq!(model.feature_size(), 3);
        assert_eq!(model.output_size(), 1);
        assert_eq!(model.num_layers(), 7);
        assert_eq!(model.swish_layers().len(), 2);
        assert_eq!(model.swish_layers()[0].input_spec().ndim, 3);
        assert_eq!(model.swish_layers()[1].input_spec().ndim, 2);
    }

    #[test]
    fn test_model_graph_forward() {
        let device = <TestBackend as Backend>::Device::default();
        let model: ModelGraph<TestBackend> = pooling_config()
            .build(&device)
            .expect("Failed to build model");

        let input = Tensor::<TestBackend, 3>::ones([5, 7, 3], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [5, 1]);
        assert_eq!(
            model.compute_output_shape([None, Some(7), Some(3)]),
            [None, Some(1)]
        );
    }

    #[test]
    fn test_padding_does_not_change_prediction() {
        let device = <TestBackend as Backend>::Device::default();
        let model: ModelGraph<TestBackend> = ModelGraphConfig::with_feature_size(2)
            .dense(4, Activation::Tanh)
            .swish()
            .sum()
            .dense(2, Activation::None)
            .build(&device)
            .unwrap();

        let short = vec![vec![0.5, -1.0], vec![2.0, 0.25]];
        let long = vec![vec![0.1, 0.2], vec![0.3, 0.4], vec![0.5, 0.6], vec![0.7, 0.8]];

        let alone = model.predict(&[short.clone()], &device).unwrap();
        let padded = model.predict(&[short, long], &device).unwrap();

        assert_eq!(padded.len(), 2);
        for (a, b) in alone[0].iter().zip(padded[0].iter()) {
            assert!((a - b).abs() < 1e-5, "padding changed output: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_sum_only_model_adds_timesteps() {
        let device = <TestBackend as Backend>::Device::default();
        let model: ModelGraph<TestBackend> =
            ModelGraphConfig::with_feature_size(2).sum().build(&device).unwrap();

        let input = Tensor::<TestBackend, 3>::from_floats([[[1.0, 2.0], [3.0, 4.0]]], &device);
        let result: Vec<f32> = model.forward(input).to_data().to_vec().unwrap();
        assert_eq!(result, vec![4.0, 6.0]);
    }

    #[test]
    fn test_masking_combines_with_caller_mask() {
        let device = <TestBackend as Backend>::Device::default();
        let model: ModelGraph<TestBackend> = ModelGraphConfig::with_feature_size(1)
            .masking(0.0)
            .sum()
            .build(&device)
            .unwrap();

        let input = Tensor::<TestBackend, 3>::from_floats([[[1.0], [0.0], [5.0], [7.0]]], &device);
        let mask = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 1.0, 0.0]], &device)
            .greater_elem(0.5);

        let result: Vec<f32> = model
            .forward_masked(input, Some(mask))
            .to_data()
            .to_vec()
            .unwrap();
        assert_eq!(result, vec![6.0]);
    }

    #[test]
    fn test_model_graph_no_layers_error() {
        let device = <TestBackend as Backend>::Device::default();
        let result: Result<ModelGraph<TestBackend>, _> =
            ModelGraphConfig::with_feature_size(4).build(&device);

        assert!(matches!(result, Err(ModelError::NoLayers)));
    }

    #[test]
    fn test_model_graph_dense_by_activation_name() {
        let config = ModelGraphConfig::with_feature_size(3)
            .dense_named(4, "relu")
            .unwrap()
            .sum();
        match &config.layers[0] {
            LayerSpec::Dense(dense) => assert_eq!(dense.activation, Activation::Relu),
            other => panic!("expected a dense layer, got {:?}", other),
        }

        let result = ModelGraphConfig::with_feature_size(3).dense_named(4, "softsign");
        assert!(matches!(result, Err(ModelError::InvalidActivation { .. })));
    }

    #[test]
    fn test_model_graph_no_input_error() {
        let device = <TestBackend as Backend>::Device::default();
        let result: Result<ModelGraph<TestBackend>, _> = ModelGraphConfig::new(vec![])
            .dense(4, Activation::Relu)
            .sum()
            .build(&device);

        assert!(matches!(result, Err(ModelError::NoInputBuffer)));
    }

    #[test]
    fn test_model_graph_missing_pooling_error() {
        let device = <TestBackend as Backend>::Device::default();
        let result: Result<ModelGraph<TestBackend>, _> = ModelGraphConfig::with_feature_size(4)
            .dense(4, Activation::Relu)
            .swish()
            .build(&device);

        assert!(matches!(result, Err(ModelError::MissingPooling)));
    }

    #[test]
    fn test_model_graph_layer_order_errors() {
        let device = <TestBackend as Backend>::Device::default();

        let double_sum: Result<ModelGraph<TestBackend>, _> = ModelGraphConfig::with_feature_size(2)
            .sum()
            .sum()
            .build(&device);
        assert!(matches!(double_sum, Err(ModelError::InvalidLayerOrder { .. })));

        let late_masking: Result<ModelGraph<TestBackend>, _> =
            ModelGraphConfig::with_feature_size(2)
                .dense(2, Activation::None)
                .masking(0.0)
                .sum()
                .build(&device);
        assert!(matches!(late_masking, Err(ModelError::InvalidLayerOrder { .. })));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let device = <TestBackend as Backend>::Device::default();
        let config = ModelGraphConfig::with_feature_size(3)
            .dense(4, Activation::Relu)
            .swish_with(
                SwishConfig::new()
                    .with_trainable_beta(false)
                    .with_beta_initializer(BetaInitializer::Constant { value: 2.0 }),
            )
            .sum()
            .dense(1, Activation::None);

        let json = config.to_json().unwrap();
        assert!(json.contains("\"class_name\": \"Swish\""));
        assert!(json.contains("\"class_name\": \"Sum\""));

        let parsed = ModelGraphConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);

        let model: ModelGraph<TestBackend> = parsed.build(&device).unwrap();
        assert_eq!(model.config(), config);
        assert!((model.swish_layers()[0].beta() - 2.0).abs() < 1e-6);
        assert!(!model.swish_layers()[0].trainable_beta());
    }

    #[test]
    fn test_from_json_rejects_unknown_layer() {
        let json = r#"{"features": ["a"], "layers": [{"class_name": "Lambda", "config": {}}]}"#;
        assert!(matches!(
            ModelGraphConfig::from_json(json),
            Err(ModelError::UnknownLayer { .. })
        ));
    }
}
