//! Serving entrypoint: load the model, decode a request, predict, encode.
//!
//! A single prediction is always encoded as a bare scalar (`4`), so callers can
//! read it back without unwrapping an array.

use std::path::Path;

use burn::prelude::Backend;
use monitor_structs::{CSV_CONTENT_TYPE, FeatureRow, FeatureRowError};
use thiserror::Error;
use tracing::debug;

use crate::{ClassifierConfig, ModelError, TrafficClassifier, load_checkpoint, predict};

pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("unsupported content type {0:?}, expected text/csv")]
    UnsupportedContentType(String),

    #[error("unsupported accept type {0:?}")]
    UnsupportedAccept(String),

    #[error("request body is empty")]
    EmptyRequest,

    #[error("request body is not valid UTF-8")]
    NotUtf8,

    #[error("invalid row {line}: {source}")]
    InvalidRow {
        line: usize,
        source: FeatureRowError,
    },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A classifier ready to serve requests.
#[derive(Debug)]
pub struct LoadedModel<B: Backend> {
    pub model: TrafficClassifier<B>,
    pub config: ClassifierConfig,
    pub device: B::Device,
}

/// Encoded response body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedResponse {
    pub body: String,
    pub content_type: &'static str,
}

/// Loads the classifier stored in `model_dir`.
///
/// # Errors
///
/// Returns an error if the checkpoint cannot be loaded.
pub fn model_fn<B: Backend>(
    model_dir: &Path,
    device: B::Device,
) -> Result<LoadedModel<B>, HandlerError> {
    let (model, config) = load_checkpoint(model_dir, &device)?;
    Ok(LoadedModel {
        model,
        config,
        device,
    })
}

/// Decodes a CSV request body into feature rows, one per non-empty line.
///
/// # Errors
///
/// Returns an error for non-CSV content types, empty or non-UTF-8 bodies, and
/// lines that are not valid feature rows.
pub fn input_fn(body: &[u8], content_type: &str) -> Result<Vec<FeatureRow>, HandlerError> {
    if media_type(content_type) != CSV_CONTENT_TYPE {
        return Err(HandlerError::UnsupportedContentType(content_type.to_string()));
    }

    let text = core::str::from_utf8(body).map_err(|_| HandlerError::NotUtf8)?;
    let rows = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line, raw)| {
            raw.parse::<FeatureRow>()
                .map_err(|source| HandlerError::InvalidRow {
                    line: line + 1,
                    source,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rows.is_empty() {
        return Err(HandlerError::EmptyRequest);
    }

    debug!(rows = rows.len(), "Decoded request");
    Ok(rows)
}

/// Runs the classifier over decoded rows.
pub fn predict_fn<B: Backend>(rows: &[FeatureRow], model: &LoadedModel<B>) -> Vec<u32> {
    predict(&model.model, rows, &model.device)
}

/// Encodes predictions for the requested `accept` type.
///
/// One prediction becomes a bare integer. Several become newline-separated
/// integers for CSV, or an array for JSON.
///
/// # Errors
///
/// Returns an error if `accept` is neither CSV, JSON, nor a wildcard.
pub fn output_fn(predictions: &[u32], accept: &str) -> Result<EncodedResponse, HandlerError> {
    let content_type = match media_type(accept) {
        "" | "*/*" | CSV_CONTENT_TYPE => CSV_CONTENT_TYPE,
        JSON_CONTENT_TYPE => JSON_CONTENT_TYPE,
        _ => return Err(HandlerError::UnsupportedAccept(accept.to_string())),
    };

    let body = match predictions {
        [single] => single.to_string(),
        many if content_type == JSON_CONTENT_TYPE => format!(
            "[{}]",
            many.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
        ),
        many => many.iter().map(u32::to_string).collect::<Vec<_>>().join("\n"),
    };

    Ok(EncodedResponse { body, content_type })
}

/// Full request path: decode, predict, encode.
///
/// # Errors
///
/// Returns any decoding or encoding error.
pub fn handle<B: Backend>(
    model: &LoadedModel<B>,
    body: &[u8],
    content_type: &str,
    accept: &str,
) -> Result<EncodedResponse, HandlerError> {
    let rows = input_fn(body, content_type)?;
    let predictions = predict_fn(&rows, model);
    output_fn(&predictions, accept)
}

fn media_type(header: &str) -> &str {
    header.split(';').next().unwrap_or_default().trim()
}
