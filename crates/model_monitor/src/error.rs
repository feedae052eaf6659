use monitor_structs::{CaptureConfigError, FeatureRowError, ScheduleError};
use sagemaker_client::ApiError;
use thiserror::Error;

/// Errors raised by the monitoring flow.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// No matching training job, report or artifact.
    #[error("not found: {0}")]
    NotFound(String),

    /// A platform call failed; code and message are the platform's.
    #[error("platform call failed: {0}")]
    Service(#[from] ApiError),

    /// A downloaded document could not be parsed.
    #[error("malformed artifact {path}: {message}")]
    MalformedArtifact { path: String, message: String },

    /// The endpoint answered with something other than one scalar.
    #[error("malformed inference response: {0:?}")]
    MalformedResponse(String),

    #[error("invalid capture config: {0}")]
    InvalidCaptureConfig(#[from] CaptureConfigError),

    #[error("invalid schedule: {0}")]
    InvalidSchedule(#[from] ScheduleError),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("invalid feature row: {0}")]
    InvalidFeatureRow(#[from] FeatureRowError),

    /// A polled endpoint or processing job ended in a failed state.
    #[error("{resource} failed: {reason}")]
    JobFailed { resource: String, reason: String },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    /// A location names a bucket other than the configured one.
    #[error("{uri} is outside the configured bucket {bucket}")]
    ForeignBucket { uri: String, bucket: String },

    #[error("storage error: {0}")]
    Storage(#[from] object_store::Error),

    #[error("local file {path}: {source}")]
    LocalIo {
        path: String,
        source: std::io::Error,
    },
}

impl MonitorError {
    pub(crate) fn malformed(path: impl ToString, message: impl ToString) -> Self {
        Self::MalformedArtifact {
            path: path.to_string(),
            message: message.to_string(),
        }
    }
}

pub(crate) fn local_io(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> MonitorError {
    let path = path.display().to_string();
    move |source| MonitorError::LocalIo { path, source }
}

pub type Result<T, E = MonitorError> = core::result::Result<T, E>;
