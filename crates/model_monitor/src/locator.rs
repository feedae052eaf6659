//! Finds the model artifact produced by the latest completed training job.

use monitor_structs::{S3Uri, TrainingJobRef, TrainingJobStatus};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{
    DescribeTrainingJobRequest, ListTrainingJobsRequest, TrainingJobSummary,
};
use tracing::info;

use crate::error::{MonitorError, Result};

/// Picks the completed job with the latest creation time.
#[must_use]
pub fn select_latest(summaries: &[TrainingJobSummary]) -> Option<&TrainingJobSummary> {
    summaries
        .iter()
        .filter(|job| job.training_job_status == TrainingJobStatus::Completed)
        .max_by_key(|job| job.creation_time)
}

/// Returns the latest completed training job whose name contains `name_prefix`.
///
/// Makes one list call, newest first; the listing is not paginated.
///
/// # Errors
///
/// Returns `NotFound` when no completed job matches, or the platform error.
pub async fn latest_completed(api: &dyn SageMakerApi, name_prefix: &str) -> Result<TrainingJobRef> {
    let response = api
        .list_training_jobs(ListTrainingJobsRequest {
            name_contains: Some(name_prefix.to_string()),
            status_equals: Some(TrainingJobStatus::Completed),
            sort_by: Some("CreationTime".to_string()),
            sort_order: Some("Descending".to_string()),
            max_results: Some(100),
            next_token: None,
        })
        .await?;

    let latest = select_latest(&response.training_job_summaries).ok_or_else(|| {
        MonitorError::NotFound(format!("completed training job matching {name_prefix:?}"))
    })?;

    info!(
        job = %latest.training_job_name,
        created = %latest.creation_time,
        candidates = response.training_job_summaries.len(),
        "Selected training job"
    );

    let artifact = locate_artifact(api, &latest.training_job_name).await?;

    Ok(TrainingJobRef {
        name: latest.training_job_name.clone(),
        status: latest.training_job_status,
        creation_time: latest.creation_time,
        artifact,
    })
}

/// Returns the `model.tar.gz` location of training job `job_name`.
///
/// # Errors
///
/// Returns the platform error, or `MalformedArtifact` if the reported
/// location is not an `s3://` URI.
pub async fn locate_artifact(api: &dyn SageMakerApi, job_name: &str) -> Result<S3Uri> {
    let job = api
        .describe_training_job(DescribeTrainingJobRequest {
            training_job_name: job_name.to_string(),
        })
        .await?;

    let artifact = job
        .model_artifacts
        .s3_model_artifacts
        .parse::<S3Uri>()
        .map_err(|e| MonitorError::malformed(format!("training job {job_name}"), e))?;

    info!(job = job_name, artifact = %artifact, "Located model artifact");
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn summary(name: &str, hour: u32, status: TrainingJobStatus) -> TrainingJobSummary {
        TrainingJobSummary {
            training_job_name: name.to_string(),
            training_job_arn: String::new(),
            creation_time: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            training_job_status: status,
        }
    }

    #[test]
    fn test_latest_completed_wins() {
        let jobs = vec![
            summary("a", 1, TrainingJobStatus::Completed),
            summary("b", 3, TrainingJobStatus::Completed),
            summary("c", 2, TrainingJobStatus::Completed),
        ];
        assert_eq!(select_latest(&jobs).unwrap().training_job_name, "b");
    }

    #[test]
    fn test_only_completed_eligible() {
        let jobs = vec![
            summary("done", 1, TrainingJobStatus::Completed),
            summary("failed", 5, TrainingJobStatus::Failed),
            summary("running", 6, TrainingJobStatus::InProgress),
        ];
        assert_eq!(select_latest(&jobs).unwrap().training_job_name, "done");
    }

    #[test]
    fn test_no_eligible_jobs() {
        let jobs = vec![summary("stopped", 1, TrainingJobStatus::Stopped)];
        assert!(select_latest(&jobs).is_none());
        assert!(select_latest(&[]).is_none());
    }
}
