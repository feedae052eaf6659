//! Data capture configuration and the records the platform writes.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CSV_CONTENT_TYPE, S3Uri};

/// Which side of an inference is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum CaptureMode {
    Input,
    Output,
}

/// Capture configuration validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureConfigError {
    #[error("sampling percentage must be within 0..=100, got {0}")]
    SamplingOutOfRange(u32),

    #[error("capture is enabled but no destination is set")]
    MissingDestination,

    #[error("capture is enabled but no capture mode is selected")]
    NoCaptureModes,
}

/// Request/response capture settings fixed at endpoint creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataCaptureConfig {
    /// Whether capture is on
    pub enabled: bool,

    /// Percentage of requests captured (0-100)
    pub sampling_percentage: u32,

    /// Where capture files are written
    pub destination: Option<S3Uri>,

    /// Captured sides of each inference
    pub capture_modes: Vec<CaptureMode>,

    /// Content types recorded as CSV text
    pub csv_content_types: Vec<String>,

    /// Content types recorded as JSON text
    pub json_content_types: Vec<String>,
}

impl DataCaptureConfig {
    /// Captures input and output of `sampling_percentage` percent of requests.
    #[must_use]
    pub fn enabled(destination: S3Uri, sampling_percentage: u32) -> Self {
        Self {
            enabled: true,
            sampling_percentage,
            destination: Some(destination),
            capture_modes: vec![CaptureMode::Input, CaptureMode::Output],
            csv_content_types: vec![CSV_CONTENT_TYPE.to_string()],
            json_content_types: vec!["application/json".to_string()],
        }
    }

    /// No capture.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            sampling_percentage: 0,
            destination: None,
            capture_modes: Vec::new(),
            csv_content_types: Vec::new(),
            json_content_types: Vec::new(),
        }
    }

    /// Checks the configuration before it is sent anywhere.
    ///
    /// # Errors
    ///
    /// Returns an error if the sampling percentage exceeds 100, or if capture
    /// is enabled without a destination or without any capture mode.
    pub fn validate(&self) -> Result<(), CaptureConfigError> {
        if self.sampling_percentage > 100 {
            return Err(CaptureConfigError::SamplingOutOfRange(
                self.sampling_percentage,
            ));
        }

        if !self.enabled {
            return Ok(());
        }

        match &self.destination {
            Some(destination) if !destination.bucket().is_empty() => {}
            _ => return Err(CaptureConfigError::MissingDestination),
        }

        if self.capture_modes.is_empty() {
            return Err(CaptureConfigError::NoCaptureModes);
        }

        Ok(())
    }
}

/// Prefix holding every capture file of one endpoint variant.
#[must_use]
pub fn capture_prefix(destination: &S3Uri, endpoint_name: &str, variant_name: &str) -> S3Uri {
    destination.join(endpoint_name).join(variant_name)
}

/// Prefix holding the capture files written during the hour containing `time`.
#[must_use]
pub fn capture_hour_prefix(
    destination: &S3Uri,
    endpoint_name: &str,
    variant_name: &str,
    time: DateTime<Utc>,
) -> S3Uri {
    capture_prefix(destination, endpoint_name, variant_name).join(format!(
        "{:04}/{:02}/{:02}/{:02}",
        time.year(),
        time.month(),
        time.day(),
        time.hour()
    ))
}

/// Whether a captured payload is the request or the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayloadMode {
    Input,
    Output,
}

/// How the captured payload text is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayloadEncoding {
    Csv,
    Json,
    Base64,
}

/// One captured request or response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturePayload {
    pub observed_content_type: String,
    pub mode: PayloadMode,
    pub data: String,
    pub encoding: PayloadEncoding,
}

/// Request and response of a captured inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_input: Option<CapturePayload>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_output: Option<CapturePayload>,
}

/// Identifiers and timestamp of a captured inference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    pub event_id: String,
    pub inference_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inference_id: Option<String>,
}

/// One line of a capture file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureRecord {
    pub capture_data: CaptureData,
    pub event_metadata: EventMetadata,
    pub event_version: String,
}

impl CaptureRecord {
    /// True when both the request and the response were captured.
    #[must_use]
    pub const fn has_request_and_response(&self) -> bool {
        self.capture_data.endpoint_input.is_some() && self.capture_data.endpoint_output.is_some()
    }

    /// Captured request body, if any.
    #[must_use]
    pub fn input_data(&self) -> Option<&str> {
        self.capture_data
            .endpoint_input
            .as_ref()
            .map(|p| p.data.as_str())
    }

    /// Captured response body, if any.
    #[must_use]
    pub fn output_data(&self) -> Option<&str> {
        self.capture_data
            .endpoint_output
            .as_ref()
            .map(|p| p.data.as_str())
    }
}

/// Parses a JSON Lines capture file, skipping blank lines.
///
/// # Errors
///
/// Returns the first line that fails to parse.
pub fn parse_capture_lines(text: &str) -> Result<Vec<CaptureRecord>, serde_json::Error> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(serde_json::from_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const RECORD: &str = r#"{"captureData":{"endpointInput":{"observedContentType":"text/csv","mode":"INPUT","data":"1,2,3","encoding":"CSV"},"endpointOutput":{"observedContentType":"text/csv; charset=utf-8","mode":"OUTPUT","data":"4","encoding":"CSV"}},"eventMetadata":{"eventId":"5f6d2a43-0b63-4c5a-9d3e-1f4a8f1c2b7e","inferenceTime":"2024-03-01T10:15:30Z"},"eventVersion":"0"}"#;

    #[test]
    fn test_validate_enabled() {
        let config = DataCaptureConfig::enabled(S3Uri::new("bucket", "capture"), 100);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_sampling_range() {
        let config = DataCaptureConfig::enabled(S3Uri::new("bucket", "capture"), 101);
        assert_eq!(
            config.validate(),
            Err(CaptureConfigError::SamplingOutOfRange(101))
        );
    }

    #[test]
    fn test_validate_missing_destination() {
        let mut config = DataCaptureConfig::enabled(S3Uri::new("bucket", "capture"), 50);
        config.destination = None;
        assert_eq!(
            config.validate(),
            Err(CaptureConfigError::MissingDestination)
        );

        config.destination = Some(S3Uri::new("", "capture"));
        assert_eq!(
            config.validate(),
            Err(CaptureConfigError::MissingDestination)
        );
    }

    #[test]
    fn test_disabled_needs_no_destination() {
        assert_eq!(DataCaptureConfig::disabled().validate(), Ok(()));
    }

    #[test]
    fn test_capture_hour_prefix() {
        let destination = S3Uri::new("bucket", "monitor/datacapture");
        let time = Utc.with_ymd_and_hms(2024, 3, 1, 7, 59, 0).unwrap();
        let prefix = capture_hour_prefix(&destination, "traffic-ep", "AllTraffic", time);
        assert_eq!(
            prefix.to_string(),
            "s3://bucket/monitor/datacapture/traffic-ep/AllTraffic/2024/03/01/07"
        );
    }

    #[test]
    fn test_parse_capture_record() {
        let text = format!("{RECORD}\n\n{RECORD}\n");
        let records = parse_capture_lines(&text).unwrap();
        assert_eq!(records.len(), 2);

        let record = &records[0];
        assert!(record.has_request_and_response());
        assert_eq!(record.input_data(), Some("1,2,3"));
        assert_eq!(record.output_data(), Some("4"));
        assert_eq!(
            record.event_metadata.inference_time,
            Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 30).unwrap()
        );
    }

    #[test]
    fn test_parse_capture_rejects_garbage() {
        assert!(parse_capture_lines("{not json}").is_err());
    }
}
