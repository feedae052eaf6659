//! Request and response shapes of the control-plane operations used here.
//!
//! Field names follow the wire format (`PascalCase`); timestamps travel as
//! epoch seconds.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use monitor_structs::{
    EndpointStatus, ExecutionStatus, ProcessingJobStatus, ScheduleStatus, TrainingJobStatus,
};
use serde::{Deserialize, Serialize};

/// Serde helpers for epoch-second timestamps.
pub mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    #[expect(
        clippy::cast_precision_loss,
        reason = "millisecond timestamps fit in an f64 mantissa"
    )]
    fn to_seconds(time: &DateTime<Utc>) -> f64 {
        time.timestamp_millis() as f64 / 1000.0
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "fractional part is in [0, 1)"
    )]
    fn from_seconds(seconds: f64) -> Option<DateTime<Utc>> {
        let whole = seconds.floor();
        let nanos = ((seconds - whole) * 1e9).round() as u32;
        DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
    }

    pub fn serialize<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_seconds(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let seconds = f64::deserialize(deserializer)?;
        from_seconds(seconds)
            .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {seconds}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[expect(
            clippy::ref_option,
            reason = "serde's `with` passes a reference to the field"
        )]
        pub fn serialize<S: Serializer>(
            time: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_some(&super::to_seconds(time)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<f64>::deserialize(deserializer)?
                .map(|seconds| {
                    super::from_seconds(seconds).ok_or_else(|| {
                        serde::de::Error::custom(format!("timestamp out of range: {seconds}"))
                    })
                })
                .transpose()
        }
    }
}

/// Response of operations that return nothing useful.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyResponse {}

// Training jobs

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTrainingJobsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_contains: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_equals: Option<TrainingJobStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListTrainingJobsResponse {
    #[serde(default)]
    pub training_job_summaries: Vec<TrainingJobSummary>,

    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainingJobSummary {
    pub training_job_name: String,

    #[serde(default)]
    pub training_job_arn: String,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    pub training_job_status: TrainingJobStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTrainingJobRequest {
    pub training_job_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeTrainingJobResponse {
    pub training_job_name: String,
    pub training_job_status: TrainingJobStatus,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    pub model_artifacts: ModelArtifacts,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModelArtifacts {
    pub s3_model_artifacts: String,
}

// Models, endpoint configs and endpoints

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateModelRequest {
    pub model_name: String,
    pub primary_container: ContainerDefinition,
    pub execution_role_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDefinition {
    pub image: String,
    pub model_data_url: String,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateModelResponse {
    #[serde(default)]
    pub model_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointConfigRequest {
    pub endpoint_config_name: String,
    pub production_variants: Vec<ProductionVariant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_capture_config: Option<DataCaptureConfigRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductionVariant {
    pub variant_name: String,
    pub model_name: String,
    pub initial_instance_count: u32,
    pub instance_type: String,
    pub initial_variant_weight: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataCaptureConfigRequest {
    pub enable_capture: bool,
    pub initial_sampling_percentage: u32,
    pub destination_s3_uri: String,
    pub capture_options: Vec<CaptureOption>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_content_type_header: Option<CaptureContentTypeHeader>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaptureOption {
    pub capture_mode: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaptureContentTypeHeader {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub csv_content_types: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_content_types: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointConfigResponse {
    #[serde(default)]
    pub endpoint_config_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointRequest {
    pub endpoint_name: String,
    pub endpoint_config_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateEndpointResponse {
    #[serde(default)]
    pub endpoint_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeEndpointRequest {
    pub endpoint_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeEndpointResponse {
    pub endpoint_name: String,

    #[serde(default)]
    pub endpoint_arn: String,

    #[serde(default)]
    pub endpoint_config_name: String,

    pub endpoint_status: EndpointStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_capture_config: Option<DataCaptureConfigSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataCaptureConfigSummary {
    pub enable_capture: bool,

    #[serde(default)]
    pub capture_status: Option<String>,

    pub current_sampling_percentage: u32,
    pub destination_s3_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteEndpointRequest {
    pub endpoint_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteEndpointConfigRequest {
    pub endpoint_config_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteModelRequest {
    pub model_name: String,
}

/// Body returned by the runtime invocation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeEndpointOutput {
    pub body: bytes::Bytes,
    pub content_type: Option<String>,
}

// Processing jobs

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProcessingJobRequest {
    pub processing_job_name: String,

    #[serde(default)]
    pub processing_inputs: Vec<ProcessingInput>,

    pub processing_output_config: ProcessingOutputConfig,
    pub processing_resources: ProcessingResources,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopping_condition: Option<StoppingCondition>,

    pub app_specification: AppSpecification,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    pub role_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingInput {
    pub input_name: String,
    pub s3_input: ProcessingS3Input,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingS3Input {
    pub s3_uri: String,
    pub local_path: String,
    pub s3_data_type: String,
    pub s3_input_mode: String,
    pub s3_data_distribution_type: String,
}

impl ProcessingS3Input {
    /// Copies every object under `s3_uri` into `local_path` before the job starts.
    #[must_use]
    pub fn prefix(s3_uri: impl Into<String>, local_path: impl Into<String>) -> Self {
        Self {
            s3_uri: s3_uri.into(),
            local_path: local_path.into(),
            s3_data_type: "S3Prefix".to_string(),
            s3_input_mode: "File".to_string(),
            s3_data_distribution_type: "FullyReplicated".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingOutputConfig {
    pub outputs: Vec<ProcessingOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingOutput {
    pub output_name: String,
    pub s3_output: S3Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Output {
    pub s3_uri: String,
    pub local_path: String,
    pub s3_upload_mode: String,
}

impl S3Output {
    /// Uploads `local_path` to `s3_uri` when the job ends.
    #[must_use]
    pub fn end_of_job(s3_uri: impl Into<String>, local_path: impl Into<String>) -> Self {
        Self {
            s3_uri: s3_uri.into(),
            local_path: local_path.into(),
            s3_upload_mode: "EndOfJob".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessingResources {
    pub cluster_config: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterConfig {
    pub instance_count: u32,
    pub instance_type: String,

    #[serde(rename = "VolumeSizeInGB")]
    pub volume_size_in_gb: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoppingCondition {
    pub max_runtime_in_seconds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSpecification {
    pub image_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_entrypoint: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_arguments: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateProcessingJobResponse {
    #[serde(default)]
    pub processing_job_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeProcessingJobRequest {
    pub processing_job_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeProcessingJobResponse {
    pub processing_job_name: String,

    #[serde(default)]
    pub processing_job_arn: String,

    pub processing_job_status: ProcessingJobStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    #[serde(
        default,
        with = "epoch_seconds::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub processing_end_time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_output_config: Option<ProcessingOutputConfig>,
}

// Monitoring schedules

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMonitoringScheduleRequest {
    pub monitoring_schedule_name: String,
    pub monitoring_schedule_config: MonitoringScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringScheduleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_config: Option<ScheduleConfig>,

    pub monitoring_job_definition: MonitoringJobDefinition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ScheduleConfig {
    pub schedule_expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringJobDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_config: Option<BaselineConfig>,

    pub monitoring_inputs: Vec<MonitoringInput>,
    pub monitoring_output_config: MonitoringOutputConfig,
    pub monitoring_resources: MonitoringResources,
    pub monitoring_app_specification: MonitoringAppSpecification,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopping_condition: Option<StoppingCondition>,

    #[serde(default)]
    pub environment: BTreeMap<String, String>,

    pub role_arn: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BaselineConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints_resource: Option<S3Resource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics_resource: Option<S3Resource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct S3Resource {
    pub s3_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringInput {
    pub endpoint_input: EndpointInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointInput {
    pub endpoint_name: String,
    pub local_path: String,
    pub s3_input_mode: String,
    pub s3_data_distribution_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringOutputConfig {
    pub monitoring_outputs: Vec<MonitoringOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringOutput {
    pub s3_output: S3Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringResources {
    pub cluster_config: ClusterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringAppSpecification {
    pub image_uri: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_preprocessor_source_uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_analytics_processor_source_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateMonitoringScheduleResponse {
    #[serde(default)]
    pub monitoring_schedule_arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeMonitoringScheduleRequest {
    pub monitoring_schedule_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeMonitoringScheduleResponse {
    pub monitoring_schedule_name: String,

    #[serde(default)]
    pub monitoring_schedule_arn: String,

    pub monitoring_schedule_status: ScheduleStatus,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_schedule_config: Option<MonitoringScheduleConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_monitoring_execution_summary: Option<MonitoringExecutionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMonitoringScheduleRequest {
    pub monitoring_schedule_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListMonitoringExecutionsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_schedule_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListMonitoringExecutionsResponse {
    #[serde(default)]
    pub monitoring_execution_summaries: Vec<MonitoringExecutionSummary>,

    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitoringExecutionSummary {
    pub monitoring_schedule_name: String,

    #[serde(with = "epoch_seconds")]
    pub scheduled_time: DateTime<Utc>,

    #[serde(with = "epoch_seconds")]
    pub creation_time: DateTime<Utc>,

    pub monitoring_execution_status: ExecutionStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_job_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}
