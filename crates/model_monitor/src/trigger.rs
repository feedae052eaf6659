//! One-off monitoring run over already captured traffic.
//!
//! Runs the same analyzer a schedule would, as a plain processing job with
//! every input given explicitly. Useful for testing a baseline without
//! waiting for the next scheduled hour.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, TimeZone, Utc};
use monitor_structs::{
    CONSTRAINTS_FILE_NAME, DatasetFormat, InstanceSpec, S3Uri, STATISTICS_FILE_NAME,
};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{
    AppSpecification, ClusterConfig, CreateProcessingJobRequest, ProcessingInput,
    ProcessingOutput, ProcessingOutputConfig, ProcessingResources, ProcessingS3Input, S3Output,
    StoppingCondition,
};
use tracing::info;

use crate::analyzer::{
    self, CONSTRAINTS_DIR, ENDPOINT_INPUT_PATH, ENV_BASELINE_CONSTRAINTS,
    ENV_BASELINE_STATISTICS, ENV_DATASET_FORMAT, ENV_DATASET_SOURCE, ENV_END_TIME,
    ENV_ENDPOINT_NAME, ENV_OUTPUT_PATH, ENV_POST_ANALYTICS_PROCESSOR,
    ENV_PUBLISH_CLOUDWATCH_METRICS, ENV_RECORD_PREPROCESSOR, ENV_SCHEDULE_NAME, ENV_START_TIME,
    POSTPROCESSING_DIR, PREPROCESSING_DIR, RESULT_OUTPUT_PATH, STATISTICS_DIR,
};
use crate::error::{MonitorError, Result};
use crate::naming::timestamped_name;
use crate::polling::PollPolicy;

const VOLUME_SIZE_GB: u32 = 20;

/// Inputs of a manual monitoring run.
#[derive(Debug, Clone)]
pub struct ManualRun {
    pub base_name: String,
    /// Capture prefix to analyze, ideally ending in `yyyy/mm/dd/hh`
    pub captured: S3Uri,
    pub statistics: S3Uri,
    pub constraints: S3Uri,
    pub output: S3Uri,
    pub image: String,
    pub instance: InstanceSpec,
    pub role_arn: String,
    pub publish_metrics: bool,
    pub endpoint_name: Option<String>,
    pub schedule_name: Option<String>,
    pub record_preprocessor: Option<S3Uri>,
    pub post_analytics_processor: Option<S3Uri>,
    pub max_runtime_seconds: Option<u32>,
}

/// A submitted manual run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggeredRun {
    pub job_name: String,
    /// Where the run writes its reports
    pub output: S3Uri,
}

/// Hour of capture data covered by `captured`, taken from its
/// `yyyy/mm/dd/hh` suffix.
#[must_use]
pub fn analysis_window(captured: &S3Uri) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let segments: Vec<&str> = captured.key().rsplit('/').take(4).collect();
    let [hour, day, month, year] = segments.as_slice() else {
        return None;
    };

    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    let start = Utc.from_utc_datetime(&date.and_hms_opt(hour.parse().ok()?, 0, 0)?);

    Some((start, start + Duration::hours(1)))
}

fn iso(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Mounts the script at `uri` under `dir` and returns its container path.
fn mount_script(
    inputs: &mut Vec<ProcessingInput>,
    name: &str,
    uri: &S3Uri,
    dir: &str,
) -> Result<String> {
    let file_name = uri
        .file_name()
        .ok_or_else(|| MonitorError::malformed(uri, "script location has no file name"))?;

    inputs.push(ProcessingInput {
        input_name: name.to_string(),
        s3_input: ProcessingS3Input::prefix(uri.to_string(), dir),
    });
    Ok(analyzer::script_path(dir, file_name))
}

/// Processing job request for `run` under `job_name`.
///
/// # Errors
///
/// Returns `MalformedArtifact` if a script location has no file name.
pub fn processing_request(run: &ManualRun, job_name: &str) -> Result<CreateProcessingJobRequest> {
    let dataset_path = format!("{ENDPOINT_INPUT_PATH}/{}", run.captured.key());
    let statistics_path = analyzer::script_path(STATISTICS_DIR, STATISTICS_FILE_NAME);
    let constraints_path = analyzer::script_path(CONSTRAINTS_DIR, CONSTRAINTS_FILE_NAME);

    let mut inputs = vec![
        ProcessingInput {
            input_name: "input_1".to_string(),
            s3_input: ProcessingS3Input::prefix(run.captured.to_string(), &dataset_path),
        },
        ProcessingInput {
            input_name: "baseline".to_string(),
            s3_input: ProcessingS3Input::prefix(run.statistics.to_string(), STATISTICS_DIR),
        },
        ProcessingInput {
            input_name: "constraints".to_string(),
            s3_input: ProcessingS3Input::prefix(run.constraints.to_string(), CONSTRAINTS_DIR),
        },
    ];

    let mut environment = BTreeMap::from([
        (
            ENV_DATASET_FORMAT.to_string(),
            DatasetFormat::CaptureJson.to_env_value(),
        ),
        (ENV_DATASET_SOURCE.to_string(), ENDPOINT_INPUT_PATH.to_string()),
        (ENV_OUTPUT_PATH.to_string(), RESULT_OUTPUT_PATH.to_string()),
        (
            ENV_PUBLISH_CLOUDWATCH_METRICS.to_string(),
            analyzer::metrics_flag(run.publish_metrics).to_string(),
        ),
        (ENV_BASELINE_STATISTICS.to_string(), statistics_path),
        (ENV_BASELINE_CONSTRAINTS.to_string(), constraints_path),
    ]);

    if let Some((start, end)) = analysis_window(&run.captured) {
        environment.insert(ENV_START_TIME.to_string(), iso(start));
        environment.insert(ENV_END_TIME.to_string(), iso(end));
    }
    if let Some(endpoint) = &run.endpoint_name {
        environment.insert(ENV_ENDPOINT_NAME.to_string(), endpoint.clone());
    }
    if let Some(schedule) = &run.schedule_name {
        environment.insert(ENV_SCHEDULE_NAME.to_string(), schedule.clone());
    }
    if let Some(script) = &run.record_preprocessor {
        let path = mount_script(&mut inputs, "pre_processor_script", script, PREPROCESSING_DIR)?;
        environment.insert(ENV_RECORD_PREPROCESSOR.to_string(), path);
    }
    if let Some(script) = &run.post_analytics_processor {
        let path = mount_script(
            &mut inputs,
            "post_processor_script",
            script,
            POSTPROCESSING_DIR,
        )?;
        environment.insert(ENV_POST_ANALYTICS_PROCESSOR.to_string(), path);
    }

    Ok(CreateProcessingJobRequest {
        processing_job_name: job_name.to_string(),
        processing_inputs: inputs,
        processing_output_config: ProcessingOutputConfig {
            outputs: vec![ProcessingOutput {
                output_name: "result".to_string(),
                s3_output: S3Output::end_of_job(run.output.to_string(), RESULT_OUTPUT_PATH),
            }],
        },
        processing_resources: ProcessingResources {
            cluster_config: ClusterConfig {
                instance_count: run.instance.instance_count,
                instance_type: run.instance.instance_type.clone(),
                volume_size_in_gb: VOLUME_SIZE_GB,
            },
        },
        stopping_condition: run.max_runtime_seconds.map(|seconds| StoppingCondition {
            max_runtime_in_seconds: seconds,
        }),
        app_specification: AppSpecification {
            image_uri: run.image.clone(),
            container_entrypoint: None,
            container_arguments: None,
        },
        environment,
        role_arn: run.role_arn.clone(),
    })
}

/// Submits one monitoring run, optionally waiting for it to finish.
///
/// # Errors
///
/// Returns the platform error, or with `wait` set, `JobFailed` or `Timeout`.
pub async fn run_once(
    api: &dyn SageMakerApi,
    run: &ManualRun,
    now: DateTime<Utc>,
    wait: Option<PollPolicy>,
) -> Result<TriggeredRun> {
    let job_name = timestamped_name(&run.base_name, now);
    let request = processing_request(run, &job_name)?;

    info!(
        job = %job_name,
        captured = %run.captured,
        output = %run.output,
        "Starting manual monitoring run"
    );
    api.create_processing_job(request).await?;

    if let Some(policy) = wait {
        analyzer::wait_for_job(api, &job_name, policy).await?;
    }

    Ok(TriggeredRun {
        job_name,
        output: run.output.clone(),
    })
}
