//! Contract of the platform's model monitor analyzer container.
//!
//! Baselining, scheduled monitoring and manual runs all execute this image.
//! It is configured entirely through environment variables and files mounted
//! at fixed container paths.

use monitor_structs::ProcessingJobStatus;
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{DescribeProcessingJobRequest, DescribeProcessingJobResponse};
use tracing::info;

use crate::error::{MonitorError, Result};
use crate::polling::{PollPolicy, PollStatus, poll_until};

pub const ENV_DATASET_FORMAT: &str = "dataset_format";
pub const ENV_DATASET_SOURCE: &str = "dataset_source";
pub const ENV_OUTPUT_PATH: &str = "output_path";
pub const ENV_PUBLISH_CLOUDWATCH_METRICS: &str = "publish_cloudwatch_metrics";
pub const ENV_BASELINE_CONSTRAINTS: &str = "baseline_constraints";
pub const ENV_BASELINE_STATISTICS: &str = "baseline_statistics";
pub const ENV_ENDPOINT_NAME: &str = "sagemaker_endpoint_name";
pub const ENV_SCHEDULE_NAME: &str = "sagemaker_monitoring_schedule_name";
pub const ENV_START_TIME: &str = "start_time";
pub const ENV_END_TIME: &str = "end_time";
pub const ENV_RECORD_PREPROCESSOR: &str = "record_preprocessor_script";
pub const ENV_POST_ANALYTICS_PROCESSOR: &str = "post_analytics_processor_script";

pub const BASELINE_DATASET_PATH: &str = "/opt/ml/processing/input/baseline_dataset_input";
pub const ANALYZER_OUTPUT_PATH: &str = "/opt/ml/processing/output";
pub const ENDPOINT_INPUT_PATH: &str = "/opt/ml/processing/input/endpoint";
pub const RESULT_OUTPUT_PATH: &str = "/opt/ml/processing/resultdata";
pub const CONSTRAINTS_DIR: &str = "/opt/ml/processing/baseline/constraints";
pub const STATISTICS_DIR: &str = "/opt/ml/processing/baseline/stats";
pub const PREPROCESSING_DIR: &str = "/opt/ml/processing/code/preprocessing";
pub const POSTPROCESSING_DIR: &str = "/opt/ml/processing/code/postprocessing";

const IMAGE_NAME: &str = "sagemaker-model-monitor-analyzer";

/// Registry account hosting the analyzer image in each region.
const ANALYZER_ACCOUNTS: &[(&str, &str)] = &[
    ("af-south-1", "875698925577"),
    ("ap-east-1", "001633400207"),
    ("ap-northeast-1", "574779866223"),
    ("ap-northeast-2", "709848358524"),
    ("ap-south-1", "126357580389"),
    ("ap-southeast-1", "245545462676"),
    ("ap-southeast-2", "563025443158"),
    ("ca-central-1", "536280801234"),
    ("cn-north-1", "453000072557"),
    ("cn-northwest-1", "453252182341"),
    ("eu-central-1", "048819808253"),
    ("eu-north-1", "895015795356"),
    ("eu-south-1", "933208885752"),
    ("eu-west-1", "468650794304"),
    ("eu-west-2", "749857270468"),
    ("eu-west-3", "680080141114"),
    ("me-south-1", "607024016150"),
    ("sa-east-1", "539772159869"),
    ("us-east-1", "156813124566"),
    ("us-east-2", "777275614652"),
    ("us-gov-west-1", "362178532790"),
    ("us-west-1", "890145073186"),
    ("us-west-2", "159807026194"),
];

/// Analyzer image URI for `region`, or `override_uri` when given.
///
/// # Errors
///
/// Returns `NotFound` for a region without a published image and no override.
pub fn analyzer_image(region: &str, override_uri: Option<&str>) -> Result<String> {
    if let Some(uri) = override_uri {
        return Ok(uri.to_string());
    }

    let account = ANALYZER_ACCOUNTS
        .iter()
        .find(|(r, _)| *r == region)
        .map(|(_, account)| *account)
        .ok_or_else(|| MonitorError::NotFound(format!("analyzer image for region {region}")))?;

    let domain = if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else {
        "amazonaws.com"
    };

    Ok(format!(
        "{account}.dkr.ecr.{region}.{domain}/{IMAGE_NAME}:latest"
    ))
}

/// `Enabled`/`Disabled` value of the metrics switch.
#[must_use]
pub const fn metrics_flag(publish: bool) -> &'static str {
    if publish { "Enabled" } else { "Disabled" }
}

/// Container path a mounted script ends up at.
#[must_use]
pub fn script_path(dir: &str, file_name: &str) -> String {
    format!("{dir}/{file_name}")
}

/// Waits until processing job `name` completes.
///
/// # Errors
///
/// Returns `JobFailed` with the platform's reason when the job fails or is
/// stopped, and `Timeout` when the policy runs out.
pub async fn wait_for_job(
    api: &dyn SageMakerApi,
    name: &str,
    policy: PollPolicy,
) -> Result<DescribeProcessingJobResponse> {
    let what = format!("processing job {name}");

    let job = poll_until(policy, &what, move || async move {
        let job = api
            .describe_processing_job(DescribeProcessingJobRequest {
                processing_job_name: name.to_string(),
            })
            .await?;

        let status = job.processing_job_status;
        if !status.is_terminal() {
            return Ok(PollStatus::Pending(status.to_string()));
        }
        if status == ProcessingJobStatus::Completed {
            return Ok(PollStatus::Ready(job));
        }

        Err(MonitorError::JobFailed {
            resource: format!("processing job {name}"),
            reason: job
                .failure_reason
                .or(job.exit_message)
                .unwrap_or_else(|| status.to_string()),
        })
    })
    .await?;

    info!(job = name, "Processing job completed");
    Ok(job)
}
