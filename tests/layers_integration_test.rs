//! Integration tests for the Swish and Sum layers through the public API.

use burn::backend::{Autodiff, NdArray};
use burn::tensor::{Tensor, backend::Backend};
use sumnet::ModelError;
use sumnet::layers::{
    Activation, BetaInitializer, Layer, LayerSpec, MaskedSumConfig, SwishConfig, custom_objects,
};
use sumnet::model_graph::{ModelGraph, ModelGraphConfig};
use sumnet::training::{Loss, TrainingConfig, train};

type TestBackend = NdArray;
type TrainingBackend = Autodiff<NdArray>;

const TOLERANCE: f32 = 1e-5;

fn floats_close(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() < tolerance
}

fn logistic(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[test]
fn test_swish_matches_formula_for_several_betas() {
    let device = <TestBackend as Backend>::Device::default();
    let xs = [-6.0f32, -2.5, -1.0, -0.1, 0.0, 0.1, 1.0, 2.5, 6.0];

    for beta in [-1.0f32, 0.0, 0.3, 1.0, 4.0] {
        let layer = SwishConfig::new()
            .with_beta_initializer(BetaInitializer::Constant { value: beta as f64 })
            .build::<TestBackend>(&[None], &device)
            .unwrap();

        let input = Tensor::<TestBackend, 1>::from_floats(xs, &device);
        let output: Vec<f32> = layer.forward(input).to_data().to_vec().unwrap();

        for (x, y) in xs.iter().zip(output.iter()) {
            let expected = x * logistic(beta * x);
            assert!(
                floats_close(*y, expected, TOLERANCE),
                "beta={}, x={}: got {}, expected {}",
                beta,
                x,
                y,
                expected
            );
        }
    }
}

#[test]
fn test_swish_saturates_without_error() {
    let device = <TestBackend as Backend>::Device::default();
    let layer = SwishConfig::new()
        .build::<TestBackend>(&[None, None], &device)
        .unwrap();

    let input = Tensor::<TestBackend, 2>::from_floats([[-1000.0, 1000.0]], &device);
    let output: Vec<f32> = layer.forward(input).to_data().to_vec().unwrap();

    assert!(output.iter().all(|v| v.is_finite()));
    assert!(floats_close(output[0], 0.0, TOLERANCE));
    assert!(floats_close(output[1], 1000.0, TOLERANCE));
}

#[test]
fn test_masked_sum_skips_masked_timesteps() {
    let device = <TestBackend as Backend>::Device::default();
    let layer = MaskedSumConfig::new().build(&[None, None, None]).unwrap();

    let values: Vec<f32> = (1..=24).map(|v| v as f32).collect();
    let input = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device)
        .reshape([2, 3, 4]);
    let mask = Tensor::<TestBackend, 2>::from_floats([[1.0, 1.0, 0.0], [1.0, 0.0, 0.0]], &device)
        .greater_elem(0.5);

    let output: Vec<f32> = layer.forward(input, Some(mask)).to_data().to_vec().unwrap();

    let first_two: Vec<f32> = (0..4).map(|f| values[f] + values[4 + f]).collect();
    let first_only: Vec<f32> = values[12..16].to_vec();
    assert_eq!(output[..4], first_two[..]);
    assert_eq!(output[4..], first_only[..]);
}

#[test]
fn test_masked_sum_without_mask() {
    let device = <TestBackend as Backend>::Device::default();
    let layer = MaskedSumConfig::new().build(&[Some(1), Some(2), Some(2)]).unwrap();

    let input = Tensor::<TestBackend, 3>::from_floats([[[1.0, 2.0], [3.0, 4.0]]], &device);
    let output = layer.forward_masked(input, None);

    assert_eq!(output.dims(), [1, 2]);
    let values: Vec<f32> = output.to_data().to_vec().unwrap();
    assert_eq!(values, vec![4.0, 6.0]);
}

#[test]
fn test_masked_sum_output_shape_drops_sequence() {
    let layer = MaskedSumConfig::new().build(&[None, None, None]).unwrap();
    for seq in [Some(1), Some(50), None] {
        let shape =
            <_ as Layer<TestBackend, 3, 2>>::compute_output_shape(&layer, [Some(3), seq, Some(7)]);
        assert_eq!(shape, [Some(3), Some(7)]);
    }
}

#[test]
fn test_swish_config_record_with_frozen_beta() {
    let device = <TestBackend as Backend>::Device::default();
    let layer = SwishConfig::new()
        .with_trainable_beta(false)
        .build::<TestBackend>(&[None, Some(4)], &device)
        .unwrap();

    let record = layer.get_config().to_record().unwrap();
    assert_eq!(record["trainable_beta"], false);
    assert_eq!(record["beta_initializer"]["class_name"], "Ones");

    let spec = LayerSpec::Swish(SwishConfig::from_record(record).unwrap());
    let rebuilt = match LayerSpec::from_value(spec.to_value().unwrap()).unwrap() {
        LayerSpec::Swish(config) => config.build::<TestBackend>(&[None, Some(4)], &device),
        other => panic!("unexpected layer {:?}", other),
    }
    .unwrap();
    assert!(!rebuilt.trainable_beta());
    assert!(floats_close(rebuilt.beta(), 1.0, TOLERANCE));
}

#[test]
fn test_registered_layers() {
    for name in ["Swish", "Sum"] {
        assert!(custom_objects().contains(&name));
    }
}

#[test]
fn test_model_json_rebuild_produces_same_structure() {
    let device = <TestBackend as Backend>::Device::default();
    let model: ModelGraph<TestBackend> = ModelGraphConfig::with_feature_size(2)
        .masking(0.0)
        .dense(3, Activation::Relu)
        .swish()
        .sum()
        .dense(1, Activation::None)
        .build(&device)
        .unwrap();

    let json = model.config().to_json().unwrap();
    let rebuilt: ModelGraph<TestBackend> = ModelGraphConfig::from_json(&json)
        .unwrap()
        .build(&device)
        .unwrap();

    assert_eq!(rebuilt.config(), model.config());
    assert_eq!(rebuilt.num_layers(), model.num_layers());
    assert_eq!(rebuilt.output_size(), 1);
}

#[test]
fn test_model_rejects_wrong_feature_width() {
    let device = <TestBackend as Backend>::Device::default();
    let model: ModelGraph<TestBackend> = ModelGraphConfig::with_feature_size(2)
        .sum()
        .build(&device)
        .unwrap();

    let result = model.predict(&[vec![vec![1.0, 2.0, 3.0]]], &device);
    assert!(matches!(result, Err(ModelError::ShapeMismatch { .. })));
}

#[test]
fn test_trained_model_predicts_sequence_sums() {
    let device = <TrainingBackend as Backend>::Device::default();
    let model: ModelGraph<TrainingBackend> = ModelGraphConfig::with_feature_size(1)
        .sum()
        .dense(1, Activation::None)
        .build(&device)
        .unwrap();

    let inputs: Vec<Vec<Vec<f32>>> = vec![
        vec![vec![1.0]],
        vec![vec![1.0], vec![2.0]],
        vec![vec![0.5], vec![0.5], vec![0.5]],
        vec![vec![-1.0], vec![3.0]],
    ];
    let targets: Vec<Vec<f32>> = vec![vec![2.0], vec![6.0], vec![3.0], vec![4.0]];

    let config = TrainingConfig::new()
        .epochs(500)
        .learning_rate(0.05)
        .loss(Loss::Mse)
        .verbose(false);

    let result = train(model, &inputs, &targets, &config, &device).unwrap();
    let final_loss = result.loss_history.last().copied().unwrap_or(f32::MAX);
    assert!(final_loss < 0.05, "final loss too high: {}", final_loss);

    let predictions = result.model.predict(&[vec![vec![2.0], vec![1.0]]], &device).unwrap();
    assert!(floats_close(predictions[0][0], 6.0, 0.5));
}
