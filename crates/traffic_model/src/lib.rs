//! Network traffic classifier served behind the hosted endpoint.
//!
//! This crate uses the Burn deep learning framework to define the
//! feedforward classifier, load it with its JSON config sidecar, and run
//! inference on [`FeatureRow`]s. The [`handler`] module holds the serving
//! entrypoint the container calls for each request.

use std::path::{Path, PathBuf};

use burn::nn::{Linear, LinearConfig, Relu};
use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use burn::tensor::TensorData;
use monitor_structs::{FEATURE_COUNT, FeatureRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod handler;
mod labels;

pub use labels::{CLASS_COUNT, CLASS_LABELS, label_name};

/// Stem of the weights file inside a model directory (`model.mpk`).
pub const MODEL_FILE_STEM: &str = "model";

/// Config sidecar written next to the weights.
pub const MODEL_CONFIG_FILE: &str = "model.config.json";

/// Errors raised while loading a classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model config {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid model config {}: {source}", path.display())]
    ConfigFormat {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("model expects {expected} features but was built for {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("failed to access model weights: {0}")]
    Record(#[from] burn::record::RecorderError),
}

/// Architecture of the traffic classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Input width, always [`FEATURE_COUNT`].
    pub input_size: usize,
    /// Number of hidden units in the first layer.
    pub hidden_size_1: usize,
    /// Number of hidden units in the second layer.
    pub hidden_size_2: usize,
    /// Number of output classes.
    pub num_classes: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            input_size: FEATURE_COUNT,
            hidden_size_1: 128,
            hidden_size_2: 64,
            num_classes: CLASS_COUNT,
        }
    }
}

/// Feedforward classifier over one flow's features.
#[derive(Module, Debug)]
pub struct TrafficClassifier<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
    linear_out: Linear<B>,
    activation: Relu,
}

impl<B: Backend> TrafficClassifier<B> {
    /// Creates a classifier with freshly initialized weights.
    pub fn new(device: &B::Device, config: &ClassifierConfig) -> Self {
        let linear1 = LinearConfig::new(config.input_size, config.hidden_size_1).init(device);
        let linear2 = LinearConfig::new(config.hidden_size_1, config.hidden_size_2).init(device);
        let linear_out = LinearConfig::new(config.hidden_size_2, config.num_classes).init(device);

        Self {
            linear1,
            linear2,
            linear_out,
            activation: Relu::new(),
        }
    }

    /// Forward pass.
    ///
    /// # Arguments
    ///
    /// * `input` - Tensor of shape [`batch_size`, `FEATURE_COUNT`]
    ///
    /// # Returns
    ///
    /// Class logits of shape [`batch_size`, `num_classes`].
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.linear1.forward(input);
        let x = self.activation.forward(x);
        let x = self.linear2.forward(x);
        let x = self.activation.forward(x);
        self.linear_out.forward(x)
    }
}

/// Creates a new classifier with the given configuration.
pub fn create_model<B: Backend>(
    device: &B::Device,
    config: &ClassifierConfig,
) -> TrafficClassifier<B> {
    TrafficClassifier::new(device, config)
}

/// Predicts a class id for every row.
///
/// Returns an empty vector for an empty batch.
pub fn predict<B: Backend>(
    model: &TrafficClassifier<B>,
    rows: &[FeatureRow],
    device: &B::Device,
) -> Vec<u32> {
    if rows.is_empty() {
        return Vec::new();
    }

    let flat: Vec<f32> = rows.iter().flat_map(|row| row.values().iter().copied()).collect();
    let input = Tensor::<B, 2>::from_data(TensorData::new(flat, [rows.len(), FEATURE_COUNT]), device);

    let logits = model.forward(input);
    let [_, num_classes] = logits.dims();
    let values: Vec<f32> = logits
        .into_data()
        .convert::<f32>()
        .to_vec()
        .unwrap_or_default();

    values.chunks(num_classes.max(1)).map(argmax).collect()
}

fn argmax(scores: &[f32]) -> u32 {
    let best = scores
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (index, &score)| {
            if score > best.1 { (index, score) } else { best }
        })
        .0;
    u32::try_from(best).unwrap_or(u32::MAX)
}

/// Loads the classifier saved in `dir`.
///
/// # Errors
///
/// Returns an error if the config is missing or malformed, if it was built for
/// a different feature width, or if the weights cannot be read.
pub fn load_checkpoint<B: Backend>(
    dir: &Path,
    device: &B::Device,
) -> Result<(TrafficClassifier<B>, ClassifierConfig), ModelError> {
    let config_path = dir.join(MODEL_CONFIG_FILE);
    let raw = std::fs::read_to_string(&config_path).map_err(|source| ModelError::ConfigIo {
        path: config_path.clone(),
        source,
    })?;
    let config: ClassifierConfig =
        serde_json::from_str(&raw).map_err(|source| ModelError::ConfigFormat {
            path: config_path,
            source,
        })?;

    if config.input_size != FEATURE_COUNT {
        return Err(ModelError::FeatureMismatch {
            expected: FEATURE_COUNT,
            actual: config.input_size,
        });
    }

    let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
    let model = TrafficClassifier::new(device, &config).load_file(
        dir.join(MODEL_FILE_STEM),
        &recorder,
        device,
    )?;

    Ok((model, config))
}
