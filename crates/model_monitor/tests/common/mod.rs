//! In-memory stand-in for the hosting platform.
//!
//! Resources are kept in maps, endpoints are in service as soon as they are
//! created and processing jobs complete on submission. Invocations answer
//! class `4` and write capture records into the shared store the way the
//! platform lays them out.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use model_monitor::storage::{self, Bucket};
use monitor_structs::{
    CONSTRAINTS_FILE_NAME, DEFAULT_VARIANT, EndpointStatus, ExecutionStatus, ProcessingJobStatus,
    S3Uri, STATISTICS_FILE_NAME, ScheduleStatus, TrainingJobStatus, VIOLATIONS_FILE_NAME,
    capture_hour_prefix,
};
use object_store::memory::InMemory;
use sagemaker_client::models::{
    CreateEndpointConfigRequest, CreateEndpointConfigResponse, CreateEndpointRequest,
    CreateEndpointResponse, CreateModelRequest, CreateModelResponse,
    CreateMonitoringScheduleRequest, CreateMonitoringScheduleResponse, CreateProcessingJobRequest,
    CreateProcessingJobResponse, DataCaptureConfigRequest, DeleteEndpointConfigRequest,
    DeleteEndpointRequest, DeleteModelRequest, DeleteMonitoringScheduleRequest,
    DescribeEndpointRequest, DescribeEndpointResponse, DescribeMonitoringScheduleRequest,
    DescribeMonitoringScheduleResponse, DescribeProcessingJobRequest,
    DescribeProcessingJobResponse, DescribeTrainingJobRequest, DescribeTrainingJobResponse,
    InvokeEndpointOutput, ListMonitoringExecutionsRequest, ListMonitoringExecutionsResponse,
    ListTrainingJobsRequest, ListTrainingJobsResponse, ModelArtifacts,
    MonitoringExecutionSummary, TrainingJobSummary,
};
use sagemaker_client::{ApiError, SageMakerApi};
use serde_json::json;

pub const BUCKET: &str = "monitor-bucket";
pub const PREDICTED_CLASS: &str = "4";

/// A training job the fake lists and describes.
#[derive(Debug, Clone)]
pub struct TrainingJob {
    pub name: String,
    pub status: TrainingJobStatus,
    pub creation_time: DateTime<Utc>,
    pub artifact: String,
}

impl TrainingJob {
    pub fn new(name: &str, status: TrainingJobStatus, day: u32) -> Self {
        Self {
            name: name.to_string(),
            status,
            creation_time: Utc
                .with_ymd_and_hms(2024, 5, day, 12, 0, 0)
                .single()
                .unwrap(),
            artifact: format!("s3://{BUCKET}/training/{name}/output/model.tar.gz"),
        }
    }
}

#[derive(Default)]
struct State {
    calls: Vec<&'static str>,
    training_jobs: Vec<TrainingJob>,
    models: HashMap<String, CreateModelRequest>,
    endpoint_configs: HashMap<String, CreateEndpointConfigRequest>,
    endpoints: HashMap<String, String>,
    invocations: HashMap<String, u64>,
    processing_jobs: HashMap<String, CreateProcessingJobRequest>,
    schedules: HashMap<String, CreateMonitoringScheduleRequest>,
    executions: Vec<MonitoringExecutionSummary>,
}

pub struct FakePlatform {
    pub store: Bucket,
    state: Mutex<State>,
}

fn not_found(what: &str) -> ApiError {
    ApiError::service("ResourceNotFound", format!("Could not find {what}"), 400)
}

fn validation(message: String) -> ApiError {
    ApiError::service("ValidationException", message, 400)
}

fn storage_error(e: &model_monitor::MonitorError) -> ApiError {
    ApiError::service("InternalFailure", e.to_string(), 500)
}

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).single().unwrap()
}

impl FakePlatform {
    pub fn new() -> Self {
        Self {
            store: Bucket::new(BUCKET, Arc::new(InMemory::new())),
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_training_jobs(jobs: Vec<TrainingJob>) -> Self {
        let platform = Self::new();
        platform.state().training_jobs = jobs;
        platform
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    fn record(&self, operation: &'static str) {
        self.state().calls.push(operation);
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state().calls.clone()
    }

    pub fn endpoint_names(&self) -> Vec<String> {
        self.state().endpoints.keys().cloned().collect()
    }

    pub fn model_count(&self) -> usize {
        self.state().models.len()
    }

    pub fn capture_config(&self, endpoint: &str) -> Option<DataCaptureConfigRequest> {
        let state = self.state();
        let config = state.endpoints.get(endpoint)?;
        state.endpoint_configs.get(config)?.data_capture_config.clone()
    }

    pub fn processing_job(&self, name: &str) -> Option<CreateProcessingJobRequest> {
        self.state().processing_jobs.get(name).cloned()
    }

    /// Adds an execution of `schedule` that ran processing job `job_name`.
    pub fn add_execution(&self, schedule: &str, job_name: &str, status: ExecutionStatus, hour: u32) {
        self.state().executions.push(MonitoringExecutionSummary {
            monitoring_schedule_name: schedule.to_string(),
            scheduled_time: Utc
                .with_ymd_and_hms(2024, 5, 1, hour, 0, 0)
                .single()
                .unwrap(),
            creation_time: created_at(),
            monitoring_execution_status: status,
            processing_job_arn: Some(format!(
                "arn:aws:sagemaker:us-east-1:123456789012:processing-job/{job_name}"
            )),
            endpoint_name: None,
            failure_reason: None,
        });
    }

    /// Capture destination and sampling of an endpoint, when capture is on.
    fn capture_target(&self, endpoint: &str) -> Result<Option<(S3Uri, bool)>, ApiError> {
        let mut state = self.state();
        let config_name = state
            .endpoints
            .get(endpoint)
            .cloned()
            .ok_or_else(|| not_found(&format!("endpoint {endpoint}")))?;
        let capture = state
            .endpoint_configs
            .get(&config_name)
            .and_then(|config| config.data_capture_config.clone());

        let count = state.invocations.entry(endpoint.to_string()).or_default();
        let n = *count;
        *count += 1;

        let Some(capture) = capture.filter(|c| c.enable_capture) else {
            return Ok(None);
        };
        let destination: S3Uri = capture
            .destination_s3_uri
            .parse()
            .map_err(|e| validation(format!("bad destination: {e}")))?;

        let rate = u64::from(capture.initial_sampling_percentage);
        let sampled = (n + 1) * rate / 100 > n * rate / 100;
        Ok(Some((destination, sampled)))
    }

    /// Writes what the analyzer would produce for a submitted job.
    async fn run_job(&self, request: &CreateProcessingJobRequest) -> Result<(), ApiError> {
        let Some(output) = request.processing_output_config.outputs.first() else {
            return Err(validation("processing job has no output".to_string()));
        };
        let output: S3Uri = output
            .s3_output
            .s3_uri
            .parse()
            .map_err(|e| validation(format!("bad output: {e}")))?;
        let store = &self.store;

        if request.environment.contains_key("baseline_constraints") {
            let violations = json!({
                "violations": [{
                    "feature_name": "_c0",
                    "constraint_check_type": "baseline_drift_check",
                    "description": "Baseline drift distance: 0.52 exceeds threshold: 0.1"
                }]
            });
            storage::put_json(store, &output.join(VIOLATIONS_FILE_NAME), &violations)
                .await
                .map_err(|e| storage_error(&e))?;
        } else {
            storage::put_json(store, &output.join(STATISTICS_FILE_NAME), &statistics())
                .await
                .map_err(|e| storage_error(&e))?;
            storage::put_json(store, &output.join(CONSTRAINTS_FILE_NAME), &constraints())
                .await
                .map_err(|e| storage_error(&e))?;
        }
        Ok(())
    }
}

pub fn statistics() -> serde_json::Value {
    json!({
        "version": 0.0,
        "dataset": {"item_count": 3},
        "features": [{
            "name": "_c0",
            "inferred_type": "Fractional",
            "numerical_statistics": {
                "common": {"num_present": 3, "num_missing": 0},
                "mean": 2.0, "sum": 6.0, "std_dev": 0.8, "min": 1.0, "max": 3.0
            }
        }]
    })
}

pub fn constraints() -> serde_json::Value {
    json!({
        "version": 0.0,
        "features": [{
            "name": "_c0",
            "inferred_type": "Fractional",
            "completeness": 1.0,
            "num_constraints": {"is_non_negative": true}
        }],
        "monitoring_config": {
            "evaluate_constraints": "Enabled",
            "emit_metrics": "Enabled",
            "datatype_check_threshold": 1.0,
            "domain_content_threshold": 1.0,
            "distribution_constraints": {
                "perform_comparison": "Enabled",
                "comparison_threshold": 0.1,
                "comparison_method": "Robust"
            }
        }
    })
}

/// A row of 78 features as the CSV the endpoint receives.
pub fn csv_row(first: f32) -> String {
    let mut values = vec![first.to_string()];
    values.extend((1..78).map(|i| i.to_string()));
    values.join(",")
}

#[async_trait]
impl SageMakerApi for FakePlatform {
    async fn list_training_jobs(
        &self,
        request: ListTrainingJobsRequest,
    ) -> Result<ListTrainingJobsResponse, ApiError> {
        self.record("ListTrainingJobs");
        let needle = request.name_contains.unwrap_or_default();
        let summaries = self
            .state()
            .training_jobs
            .iter()
            .filter(|job| job.name.contains(&needle))
            .map(|job| TrainingJobSummary {
                training_job_name: job.name.clone(),
                training_job_arn: format!("arn:aws:sagemaker:::training-job/{}", job.name),
                creation_time: job.creation_time,
                training_job_status: job.status,
            })
            .collect();

        Ok(ListTrainingJobsResponse {
            training_job_summaries: summaries,
            next_token: None,
        })
    }

    async fn describe_training_job(
        &self,
        request: DescribeTrainingJobRequest,
    ) -> Result<DescribeTrainingJobResponse, ApiError> {
        self.record("DescribeTrainingJob");
        let state = self.state();
        let job = state
            .training_jobs
            .iter()
            .find(|job| job.name == request.training_job_name)
            .ok_or_else(|| not_found(&request.training_job_name))?;

        Ok(DescribeTrainingJobResponse {
            training_job_name: job.name.clone(),
            training_job_status: job.status,
            creation_time: job.creation_time,
            model_artifacts: ModelArtifacts {
                s3_model_artifacts: job.artifact.clone(),
            },
            failure_reason: None,
        })
    }

    async fn create_model(
        &self,
        request: CreateModelRequest,
    ) -> Result<CreateModelResponse, ApiError> {
        self.record("CreateModel");
        let arn = format!("arn:aws:sagemaker:::model/{}", request.model_name);
        self.state().models.insert(request.model_name.clone(), request);
        Ok(CreateModelResponse { model_arn: arn })
    }

    async fn create_endpoint_config(
        &self,
        request: CreateEndpointConfigRequest,
    ) -> Result<CreateEndpointConfigResponse, ApiError> {
        self.record("CreateEndpointConfig");
        let arn = format!("arn:aws:sagemaker:::endpoint-config/{}", request.endpoint_config_name);
        self.state()
            .endpoint_configs
            .insert(request.endpoint_config_name.clone(), request);
        Ok(CreateEndpointConfigResponse {
            endpoint_config_arn: arn,
        })
    }

    async fn create_endpoint(
        &self,
        request: CreateEndpointRequest,
    ) -> Result<CreateEndpointResponse, ApiError> {
        self.record("CreateEndpoint");
        let mut state = self.state();
        if !state.endpoint_configs.contains_key(&request.endpoint_config_name) {
            return Err(not_found(&request.endpoint_config_name));
        }
        let arn = format!("arn:aws:sagemaker:::endpoint/{}", request.endpoint_name);
        state
            .endpoints
            .insert(request.endpoint_name, request.endpoint_config_name);
        Ok(CreateEndpointResponse { endpoint_arn: arn })
    }

    async fn describe_endpoint(
        &self,
        request: DescribeEndpointRequest,
    ) -> Result<DescribeEndpointResponse, ApiError> {
        self.record("DescribeEndpoint");
        let state = self.state();
        let config = state
            .endpoints
            .get(&request.endpoint_name)
            .ok_or_else(|| not_found(&request.endpoint_name))?;

        Ok(DescribeEndpointResponse {
            endpoint_arn: format!("arn:aws:sagemaker:::endpoint/{}", request.endpoint_name),
            endpoint_name: request.endpoint_name,
            endpoint_config_name: config.clone(),
            endpoint_status: EndpointStatus::InService,
            failure_reason: None,
            creation_time: created_at(),
            data_capture_config: None,
        })
    }

    async fn delete_endpoint(&self, request: DeleteEndpointRequest) -> Result<(), ApiError> {
        self.record("DeleteEndpoint");
        self.state()
            .endpoints
            .remove(&request.endpoint_name)
            .map(|_| ())
            .ok_or_else(|| not_found(&request.endpoint_name))
    }

    async fn delete_endpoint_config(
        &self,
        request: DeleteEndpointConfigRequest,
    ) -> Result<(), ApiError> {
        self.record("DeleteEndpointConfig");
        self.state()
            .endpoint_configs
            .remove(&request.endpoint_config_name)
            .map(|_| ())
            .ok_or_else(|| not_found(&request.endpoint_config_name))
    }

    async fn delete_model(&self, request: DeleteModelRequest) -> Result<(), ApiError> {
        self.record("DeleteModel");
        self.state()
            .models
            .remove(&request.model_name)
            .map(|_| ())
            .ok_or_else(|| not_found(&request.model_name))
    }

    async fn invoke_endpoint(
        &self,
        endpoint_name: &str,
        content_type: &str,
        accept: &str,
        body: Bytes,
    ) -> Result<InvokeEndpointOutput, ApiError> {
        self.record("InvokeEndpoint");
        let input = String::from_utf8(body.to_vec())
            .map_err(|e| validation(format!("request body is not UTF-8: {e}")))?;

        if let Some((destination, true)) = self.capture_target(endpoint_name)? {
            let now = Utc::now();
            let record = json!({
                "captureData": {
                    "endpointInput": {
                        "observedContentType": content_type,
                        "mode": "INPUT",
                        "data": input,
                        "encoding": "CSV"
                    },
                    "endpointOutput": {
                        "observedContentType": accept,
                        "mode": "OUTPUT",
                        "data": PREDICTED_CLASS,
                        "encoding": "CSV"
                    }
                },
                "eventMetadata": {
                    "eventId": uuid::Uuid::new_v4().to_string(),
                    "inferenceTime": now.to_rfc3339()
                },
                "eventVersion": "0"
            });
            let file = capture_hour_prefix(&destination, endpoint_name, DEFAULT_VARIANT, now)
                .join(format!("{}.jsonl", uuid::Uuid::new_v4()));
            storage::put_bytes(&self.store, &file, format!("{record}\n").into())
                .await
                .map_err(|e| storage_error(&e))?;
        }

        Ok(InvokeEndpointOutput {
            body: Bytes::from_static(PREDICTED_CLASS.as_bytes()),
            content_type: Some(accept.to_string()),
        })
    }

    async fn create_processing_job(
        &self,
        request: CreateProcessingJobRequest,
    ) -> Result<CreateProcessingJobResponse, ApiError> {
        self.record("CreateProcessingJob");
        self.run_job(&request).await?;

        let arn = format!(
            "arn:aws:sagemaker:us-east-1:123456789012:processing-job/{}",
            request.processing_job_name
        );
        self.state()
            .processing_jobs
            .insert(request.processing_job_name.clone(), request);
        Ok(CreateProcessingJobResponse {
            processing_job_arn: arn,
        })
    }

    async fn describe_processing_job(
        &self,
        request: DescribeProcessingJobRequest,
    ) -> Result<DescribeProcessingJobResponse, ApiError> {
        self.record("DescribeProcessingJob");
        let state = self.state();
        let job = state
            .processing_jobs
            .get(&request.processing_job_name)
            .ok_or_else(|| not_found(&request.processing_job_name))?;

        Ok(DescribeProcessingJobResponse {
            processing_job_name: job.processing_job_name.clone(),
            processing_job_arn: String::new(),
            processing_job_status: ProcessingJobStatus::Completed,
            exit_message: None,
            failure_reason: None,
            creation_time: created_at(),
            processing_end_time: Some(created_at()),
            processing_output_config: Some(job.processing_output_config.clone()),
        })
    }

    async fn create_monitoring_schedule(
        &self,
        request: CreateMonitoringScheduleRequest,
    ) -> Result<CreateMonitoringScheduleResponse, ApiError> {
        self.record("CreateMonitoringSchedule");
        let mut state = self.state();
        let name = request.monitoring_schedule_name.clone();
        if state.schedules.contains_key(&name) {
            return Err(ApiError::service(
                "ResourceInUse",
                format!("Schedule {name} already exists"),
                400,
            ));
        }
        state.schedules.insert(name.clone(), request);
        Ok(CreateMonitoringScheduleResponse {
            monitoring_schedule_arn: format!("arn:aws:sagemaker:::monitoring-schedule/{name}"),
        })
    }

    async fn describe_monitoring_schedule(
        &self,
        request: DescribeMonitoringScheduleRequest,
    ) -> Result<DescribeMonitoringScheduleResponse, ApiError> {
        self.record("DescribeMonitoringSchedule");
        let state = self.state();
        let name = request.monitoring_schedule_name;
        let schedule = state
            .schedules
            .get(&name)
            .ok_or_else(|| not_found(&format!("schedule {name}")))?;

        Ok(DescribeMonitoringScheduleResponse {
            monitoring_schedule_arn: format!("arn:aws:sagemaker:::monitoring-schedule/{name}"),
            monitoring_schedule_name: name,
            monitoring_schedule_status: ScheduleStatus::Scheduled,
            creation_time: created_at(),
            endpoint_name: schedule
                .monitoring_schedule_config
                .monitoring_job_definition
                .monitoring_inputs
                .first()
                .map(|input| input.endpoint_input.endpoint_name.clone()),
            failure_reason: None,
            monitoring_schedule_config: Some(schedule.monitoring_schedule_config.clone()),
            last_monitoring_execution_summary: None,
        })
    }

    async fn delete_monitoring_schedule(
        &self,
        request: DeleteMonitoringScheduleRequest,
    ) -> Result<(), ApiError> {
        self.record("DeleteMonitoringSchedule");
        let name = request.monitoring_schedule_name;
        self.state()
            .schedules
            .remove(&name)
            .map(|_| ())
            .ok_or_else(|| not_found(&format!("schedule {name}")))
    }

    async fn list_monitoring_executions(
        &self,
        request: ListMonitoringExecutionsRequest,
    ) -> Result<ListMonitoringExecutionsResponse, ApiError> {
        self.record("ListMonitoringExecutions");
        let summaries = self
            .state()
            .executions
            .iter()
            .filter(|e| {
                request
                    .monitoring_schedule_name
                    .as_ref()
                    .is_none_or(|name| *name == e.monitoring_schedule_name)
            })
            .cloned()
            .collect();

        Ok(ListMonitoringExecutionsResponse {
            monitoring_execution_summaries: summaries,
            next_token: None,
        })
    }
}
