//! Baseline statistics and constraints computed from the validation dataset.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use monitor_structs::{
    CONSTRAINTS_FILE_NAME, ComparisonMethod, Constraints, DatasetFormat, InstanceSpec,
    STATISTICS_FILE_NAME, S3Uri, Statistics, Toggle,
};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{
    AppSpecification, ClusterConfig, CreateProcessingJobRequest, ProcessingInput,
    ProcessingOutput, ProcessingOutputConfig, ProcessingResources, ProcessingS3Input, S3Output,
    StoppingCondition,
};
use tracing::info;

use crate::analyzer::{
    self, ANALYZER_OUTPUT_PATH, BASELINE_DATASET_PATH, ENV_DATASET_FORMAT, ENV_DATASET_SOURCE,
    ENV_OUTPUT_PATH, ENV_PUBLISH_CLOUDWATCH_METRICS,
};
use crate::error::Result;
use crate::naming::timestamped_name;
use crate::polling::PollPolicy;
use crate::storage::{self, Bucket};

const VOLUME_SIZE_GB: u32 = 20;

/// A baselining job over one dataset.
#[derive(Debug, Clone)]
pub struct BaselineJob {
    pub base_name: String,
    pub dataset: S3Uri,
    pub format: DatasetFormat,
    /// Receives `statistics.json` and `constraints.json`
    pub output: S3Uri,
    pub image: String,
    pub instance: InstanceSpec,
    pub role_arn: String,
    pub publish_metrics: bool,
    pub max_runtime_seconds: Option<u32>,
}

/// Where a submitted baselining job writes its documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineRun {
    pub job_name: String,
    pub statistics: S3Uri,
    pub constraints: S3Uri,
}

/// Processing job request for `job` under `job_name`.
#[must_use]
pub fn baseline_request(job: &BaselineJob, job_name: &str) -> CreateProcessingJobRequest {
    let mut environment = BTreeMap::new();
    environment.insert(ENV_DATASET_FORMAT.to_string(), job.format.to_env_value());
    environment.insert(
        ENV_DATASET_SOURCE.to_string(),
        BASELINE_DATASET_PATH.to_string(),
    );
    environment.insert(ENV_OUTPUT_PATH.to_string(), ANALYZER_OUTPUT_PATH.to_string());
    environment.insert(
        ENV_PUBLISH_CLOUDWATCH_METRICS.to_string(),
        analyzer::metrics_flag(job.publish_metrics).to_string(),
    );

    CreateProcessingJobRequest {
        processing_job_name: job_name.to_string(),
        processing_inputs: vec![ProcessingInput {
            input_name: "baseline_dataset_input".to_string(),
            s3_input: ProcessingS3Input::prefix(job.dataset.to_string(), BASELINE_DATASET_PATH),
        }],
        processing_output_config: ProcessingOutputConfig {
            outputs: vec![ProcessingOutput {
                output_name: "monitoring_output".to_string(),
                s3_output: S3Output::end_of_job(job.output.to_string(), ANALYZER_OUTPUT_PATH),
            }],
        },
        processing_resources: ProcessingResources {
            cluster_config: ClusterConfig {
                instance_count: job.instance.instance_count,
                instance_type: job.instance.instance_type.clone(),
                volume_size_in_gb: VOLUME_SIZE_GB,
            },
        },
        stopping_condition: job.max_runtime_seconds.map(|seconds| StoppingCondition {
            max_runtime_in_seconds: seconds,
        }),
        app_specification: AppSpecification {
            image_uri: job.image.clone(),
            container_entrypoint: None,
            container_arguments: None,
        },
        environment,
        role_arn: job.role_arn.clone(),
    }
}

/// Submits a baselining job, optionally waiting for it to complete.
///
/// # Errors
///
/// Returns the platform error, or with `wait` set, `JobFailed` carrying the
/// platform's reason or `Timeout`.
pub async fn suggest_baseline(
    api: &dyn SageMakerApi,
    job: &BaselineJob,
    now: DateTime<Utc>,
    wait: Option<PollPolicy>,
) -> Result<BaselineRun> {
    let job_name = timestamped_name(&job.base_name, now);

    info!(
        job = %job_name,
        dataset = %job.dataset,
        output = %job.output,
        "Submitting baselining job"
    );
    api.create_processing_job(baseline_request(job, &job_name))
        .await?;

    if let Some(policy) = wait {
        analyzer::wait_for_job(api, &job_name, policy).await?;
    }

    Ok(BaselineRun {
        job_name,
        statistics: job.output.join(STATISTICS_FILE_NAME),
        constraints: job.output.join(CONSTRAINTS_FILE_NAME),
    })
}

/// Statistics and constraints of one baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    pub statistics: Statistics,
    pub constraints: Constraints,
}

/// Downloads both baseline documents from `output`.
///
/// # Errors
///
/// Returns a storage error, or `MalformedArtifact` if a document does not parse.
pub async fn load_baseline(store: &Bucket, output: &S3Uri) -> Result<Baseline> {
    let statistics = storage::get_json(store, &output.join(STATISTICS_FILE_NAME)).await?;
    let constraints = storage::get_json(store, &output.join(CONSTRAINTS_FILE_NAME)).await?;

    Ok(Baseline {
        statistics,
        constraints,
    })
}

/// Local changes to a constraints document. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintsEdit {
    pub comparison_method: Option<ComparisonMethod>,
    pub comparison_threshold: Option<f64>,
    pub perform_comparison: Option<bool>,
    pub evaluate_constraints: Option<bool>,
    pub emit_metrics: Option<bool>,
}

impl ConstraintsEdit {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Applies `edit` to the monitoring section, creating it if needed.
///
/// Feature rules and unknown fields are untouched.
pub fn edit_constraints(constraints: &mut Constraints, edit: &ConstraintsEdit) {
    let config = constraints.monitoring_config_mut();

    if let Some(evaluate) = edit.evaluate_constraints {
        config.evaluate_constraints = Toggle::from(evaluate);
    }
    if let Some(emit) = edit.emit_metrics {
        config.emit_metrics = Toggle::from(emit);
    }

    let distribution = &mut config.distribution_constraints;
    if let Some(method) = edit.comparison_method {
        distribution.comparison_method = method;
    }
    if let Some(threshold) = edit.comparison_threshold {
        distribution.comparison_threshold = threshold;
    }
    if let Some(perform) = edit.perform_comparison {
        distribution.perform_comparison = Toggle::from(perform);
    }
}

/// Uploads `constraints` as `constraints.json` under `output`.
///
/// # Errors
///
/// Returns a storage error.
pub async fn save_constraints(
    store: &Bucket,
    output: &S3Uri,
    constraints: &Constraints,
) -> Result<S3Uri> {
    let uri = output.join(CONSTRAINTS_FILE_NAME);
    storage::put_json(store, &uri, constraints).await?;
    info!(uri = %uri, "Uploaded constraints");
    Ok(uri)
}

/// One row of the baseline summary.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSummary {
    pub name: String,
    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Per-feature mean/min/max; non-numeric features have empty cells.
#[must_use]
pub fn summarize(statistics: &Statistics) -> Vec<FeatureSummary> {
    statistics
        .features
        .iter()
        .map(|feature| {
            let numeric = feature.numerical_statistics.as_ref();
            FeatureSummary {
                name: feature.name.clone(),
                mean: numeric.map(|n| n.mean),
                min: numeric.map(|n| n.min),
                max: numeric.map(|n| n.max),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::memory::InMemory;

    use super::*;

    fn job() -> BaselineJob {
        BaselineJob {
            base_name: "traffic-baseline".to_string(),
            dataset: S3Uri::new("bucket", "baselining/data/validation.csv"),
            format: DatasetFormat::csv_with_header(),
            output: S3Uri::new("bucket", "baselining/results"),
            image: "analyzer:latest".to_string(),
            instance: InstanceSpec::default(),
            role_arn: "arn:aws:iam::123:role/monitor".to_string(),
            publish_metrics: false,
            max_runtime_seconds: Some(3600),
        }
    }

    #[test]
    fn test_baseline_request_environment() {
        let request = baseline_request(&job(), "traffic-baseline-1");

        assert_eq!(request.environment[ENV_DATASET_SOURCE], BASELINE_DATASET_PATH);
        assert_eq!(request.environment[ENV_OUTPUT_PATH], ANALYZER_OUTPUT_PATH);
        assert_eq!(request.environment[ENV_PUBLISH_CLOUDWATCH_METRICS], "Disabled");
        assert!(request.environment[ENV_DATASET_FORMAT].contains("\"csv\""));
        assert_eq!(
            request.processing_inputs[0].s3_input.s3_uri,
            "s3://bucket/baselining/data/validation.csv"
        );
        assert_eq!(
            request.processing_output_config.outputs[0].s3_output.s3_uri,
            "s3://bucket/baselining/results"
        );
    }

    #[test]
    fn test_edit_constraints_partial() {
        let mut constraints: Constraints =
            serde_json::from_str(r#"{"version": 0.0, "features": [], "custom": 1}"#).unwrap();

        edit_constraints(
            &mut constraints,
            &ConstraintsEdit {
                comparison_method: Some(ComparisonMethod::Simple),
                comparison_threshold: Some(0.5),
                ..ConstraintsEdit::default()
            },
        );

        let config = constraints.monitoring_config.as_ref().unwrap();
        assert_eq!(
            config.distribution_constraints.comparison_method,
            ComparisonMethod::Simple
        );
        assert!((config.distribution_constraints.comparison_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.evaluate_constraints, Toggle::Enabled);
        assert_eq!(constraints.extra["custom"], 1);
    }

    #[test]
    fn test_empty_edit() {
        assert!(ConstraintsEdit::default().is_empty());
        assert!(
            !ConstraintsEdit {
                emit_metrics: Some(false),
                ..ConstraintsEdit::default()
            }
            .is_empty()
        );
    }

    #[tokio::test]
    async fn test_save_and_load_baseline() {
        let store = Bucket::new("bucket", Arc::new(InMemory::new()));
        let output = S3Uri::new("bucket", "baselining/results");

        storage::put_bytes(
            &store,
            &output.join(STATISTICS_FILE_NAME),
            r#"{"version": 0.0, "dataset": {"item_count": 3}, "features": [
                {"name": "Flow Duration", "inferred_type": "Fractional",
                 "numerical_statistics": {"common": {"num_present": 3, "num_missing": 0},
                 "mean": 2.0, "sum": 6.0, "std_dev": 1.0, "min": 1.0, "max": 3.0}}
            ]}"#
            .into(),
        )
        .await
        .unwrap();

        let constraints: Constraints =
            serde_json::from_str(r#"{"version": 0.0, "features": []}"#).unwrap();
        save_constraints(&store, &output, &constraints).await.unwrap();

        let baseline = load_baseline(&store, &output).await.unwrap();
        assert_eq!(baseline.statistics.dataset.item_count, 3);
        assert_eq!(baseline.constraints, constraints);

        let summary = summarize(&baseline.statistics);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].max, Some(3.0));
    }
}
