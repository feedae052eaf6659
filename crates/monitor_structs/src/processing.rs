use serde::{Deserialize, Serialize};
use serde_json::json;

/// Processing job status as reported by the platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum ProcessingJobStatus {
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

impl ProcessingJobStatus {
    /// True once the job can no longer change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Stopped)
    }
}

/// Dataset format declaration understood by the analyzer container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetFormat {
    /// Delimited text with the label in the first column
    Csv { header: bool },

    /// Endpoint capture files
    CaptureJson,
}

impl DatasetFormat {
    /// CSV with a header and the label in the first column.
    #[must_use]
    pub const fn csv_with_header() -> Self {
        Self::Csv { header: true }
    }

    /// Value of the analyzer's `dataset_format` environment variable.
    #[must_use]
    pub fn to_env_value(&self) -> String {
        let value = match self {
            Self::Csv { header } => json!({
                "csv": {
                    "header": header,
                    "output_columns_position": "START",
                }
            }),
            Self::CaptureJson => json!({
                "sagemakerCaptureJson": {
                    "captureIndexNames": ["endpointInput", "endpointOutput"]
                }
            }),
        };
        value.to_string()
    }
}
