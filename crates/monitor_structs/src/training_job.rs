use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::S3Uri;

/// Training job status as reported by the platform.
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
pub enum TrainingJobStatus {
    InProgress,
    Completed,
    Failed,
    Stopping,
    Stopped,
}

/// A finished training job and the model artifact it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingJobRef {
    /// Training job name
    pub name: String,

    /// Final status (always `Completed` when returned by the locator)
    pub status: TrainingJobStatus,

    /// When the job was created
    pub creation_time: DateTime<Utc>,

    /// Location of `model.tar.gz`
    pub artifact: S3Uri,
}
