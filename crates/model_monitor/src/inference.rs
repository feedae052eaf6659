//! Sends feature rows to a hosted endpoint and decodes the predicted class.

use bytes::Bytes;
use monitor_structs::{CSV_CONTENT_TYPE, FeatureRow};
use sagemaker_client::SageMakerApi;
use tracing::debug;

use crate::error::{MonitorError, Result};

/// Predicts the class of one flow.
///
/// # Errors
///
/// Returns the platform error, or `MalformedResponse` when the body is not a
/// single class label.
pub async fn predict(api: &dyn SageMakerApi, endpoint_name: &str, row: &FeatureRow) -> Result<u32> {
    let output = api
        .invoke_endpoint(
            endpoint_name,
            CSV_CONTENT_TYPE,
            CSV_CONTENT_TYPE,
            Bytes::from(row.to_csv_line()),
        )
        .await?;

    let label = decode_label(&output.body)?;
    debug!(endpoint = endpoint_name, label, "Prediction");
    Ok(label)
}

/// Predicts each row with its own request, in order.
///
/// # Errors
///
/// Stops at the first failed request.
pub async fn predict_many(
    api: &dyn SageMakerApi,
    endpoint_name: &str,
    rows: &[FeatureRow],
) -> Result<Vec<u32>> {
    let mut labels = Vec::with_capacity(rows.len());
    for row in rows {
        labels.push(predict(api, endpoint_name, row).await?);
    }
    Ok(labels)
}

/// Decodes a response body holding exactly one class label.
///
/// Accepts `4` and `4.0`. Arrays such as `[4.0]`, several values and
/// fractional numbers are rejected.
///
/// # Errors
///
/// Returns `MalformedResponse` with the body text.
pub fn decode_label(body: &[u8]) -> Result<u32> {
    let text = core::str::from_utf8(body)
        .map_err(|_| MonitorError::MalformedResponse(String::from_utf8_lossy(body).into_owned()))?;
    let trimmed = text.trim();
    let malformed = || MonitorError::MalformedResponse(text.to_string());

    if trimmed.is_empty() || trimmed.contains(|c: char| c == ',' || c.is_whitespace()) {
        return Err(malformed());
    }

    if let Ok(label) = trimmed.parse::<u32>() {
        return Ok(label);
    }

    let value = trimmed.parse::<f64>().map_err(|_| malformed())?;
    if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > f64::from(u32::MAX) {
        return Err(malformed());
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_scalar() {
        assert_eq!(decode_label(b"4").unwrap(), 4);
        assert_eq!(decode_label(b"4.0").unwrap(), 4);
        assert_eq!(decode_label(b" 12\n").unwrap(), 12);
    }

    #[test]
    fn test_decode_rejects_array() {
        assert!(matches!(
            decode_label(b"[4.0]"),
            Err(MonitorError::MalformedResponse(body)) if body == "[4.0]"
        ));
    }

    #[test]
    fn test_decode_rejects_multiple_values() {
        assert!(decode_label(b"4,5").is_err());
        assert!(decode_label(b"4\n5").is_err());
    }

    #[test]
    fn test_decode_rejects_non_labels() {
        assert!(decode_label(b"").is_err());
        assert!(decode_label(b"4.5").is_err());
        assert!(decode_label(b"-1").is_err());
        assert!(decode_label(b"benign").is_err());
        assert!(decode_label(&[0xff, 0xfe]).is_err());
    }
}
