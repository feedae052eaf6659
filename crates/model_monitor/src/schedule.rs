//! Recurring data-quality monitoring of an endpoint.
//!
//! A [`ScheduleManager`] owns one schedule name and tracks its local
//! lifecycle. A schedule cannot be edited: delete it and create it again to
//! change anything.

use std::collections::BTreeMap;

use monitor_structs::{
    InstanceSpec, MonitoringExecution, MonitoringSchedule, S3Uri, ScheduleExpression,
    ScheduleLifecycle,
};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{
    BaselineConfig, ClusterConfig, CreateMonitoringScheduleRequest,
    DeleteMonitoringScheduleRequest, DescribeMonitoringScheduleRequest,
    DescribeMonitoringScheduleResponse, EndpointInput, ListMonitoringExecutionsRequest,
    MonitoringAppSpecification, MonitoringExecutionSummary, MonitoringInput,
    MonitoringJobDefinition, MonitoringOutput, MonitoringOutputConfig, MonitoringResources,
    MonitoringScheduleConfig, S3Output, S3Resource, ScheduleConfig, StoppingCondition,
};
use tracing::info;

use crate::analyzer::{
    self, ANALYZER_OUTPUT_PATH, ENDPOINT_INPUT_PATH, ENV_PUBLISH_CLOUDWATCH_METRICS,
};
use crate::error::{MonitorError, Result};
use crate::polling::{PollPolicy, PollStatus, poll_until};

const VOLUME_SIZE_GB: u32 = 20;
const MAX_EXECUTIONS: u32 = 100;

/// Configuration of a new schedule.
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub endpoint_name: String,
    pub statistics: S3Uri,
    pub constraints: S3Uri,
    /// Reports land under `{output}/{endpoint}/{schedule}/...`
    pub output: S3Uri,
    pub expression: ScheduleExpression,
    pub image: String,
    pub instance: InstanceSpec,
    pub role_arn: String,
    pub publish_metrics: bool,
    /// Forwarded to the analyzer as-is
    pub record_preprocessor: Option<S3Uri>,
    /// Forwarded to the analyzer as-is
    pub post_analytics_processor: Option<S3Uri>,
    pub max_runtime_seconds: Option<u32>,
}

/// Builds the platform's schedule config.
///
/// # Errors
///
/// Returns `InvalidSchedule` if the expression does not render to a valid cron.
pub fn schedule_config(request: &ScheduleRequest) -> Result<MonitoringScheduleConfig> {
    let cron = request.expression.to_cron()?;

    let mut environment = BTreeMap::new();
    environment.insert(
        ENV_PUBLISH_CLOUDWATCH_METRICS.to_string(),
        analyzer::metrics_flag(request.publish_metrics).to_string(),
    );

    Ok(MonitoringScheduleConfig {
        schedule_config: Some(ScheduleConfig {
            schedule_expression: cron,
        }),
        monitoring_job_definition: MonitoringJobDefinition {
            baseline_config: Some(BaselineConfig {
                constraints_resource: Some(S3Resource {
                    s3_uri: request.constraints.to_string(),
                }),
                statistics_resource: Some(S3Resource {
                    s3_uri: request.statistics.to_string(),
                }),
            }),
            monitoring_inputs: vec![MonitoringInput {
                endpoint_input: EndpointInput {
                    endpoint_name: request.endpoint_name.clone(),
                    local_path: ENDPOINT_INPUT_PATH.to_string(),
                    s3_input_mode: "File".to_string(),
                    s3_data_distribution_type: "FullyReplicated".to_string(),
                },
            }],
            monitoring_output_config: MonitoringOutputConfig {
                monitoring_outputs: vec![MonitoringOutput {
                    s3_output: S3Output::end_of_job(
                        request.output.to_string(),
                        ANALYZER_OUTPUT_PATH,
                    ),
                }],
            },
            monitoring_resources: MonitoringResources {
                cluster_config: ClusterConfig {
                    instance_count: request.instance.instance_count,
                    instance_type: request.instance.instance_type.clone(),
                    volume_size_in_gb: VOLUME_SIZE_GB,
                },
            },
            monitoring_app_specification: MonitoringAppSpecification {
                image_uri: request.image.clone(),
                record_preprocessor_source_uri: request
                    .record_preprocessor
                    .as_ref()
                    .map(ToString::to_string),
                post_analytics_processor_source_uri: request
                    .post_analytics_processor
                    .as_ref()
                    .map(ToString::to_string),
            },
            stopping_condition: request
                .max_runtime_seconds
                .map(|seconds| StoppingCondition {
                    max_runtime_in_seconds: seconds,
                }),
            environment,
            role_arn: request.role_arn.clone(),
        },
    })
}

/// Manages one named monitoring schedule.
pub struct ScheduleManager<'a> {
    api: &'a dyn SageMakerApi,
    name: String,
    lifecycle: ScheduleLifecycle,
}

impl<'a> ScheduleManager<'a> {
    /// Manager for a schedule that does not exist yet.
    pub fn new(api: &'a dyn SageMakerApi, name: impl Into<String>) -> Self {
        Self {
            api,
            name: name.into(),
            lifecycle: ScheduleLifecycle::Absent,
        }
    }

    /// Manager for a schedule that may already exist on the platform.
    ///
    /// # Errors
    ///
    /// Returns the platform error if the schedule cannot be described.
    pub async fn attach(api: &'a dyn SageMakerApi, name: impl Into<String>) -> Result<Self> {
        let mut manager = Self::new(api, name);
        if manager.describe().await?.is_some() {
            manager.lifecycle = ScheduleLifecycle::Active;
        }
        Ok(manager)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn lifecycle(&self) -> ScheduleLifecycle {
        self.lifecycle
    }

    /// Creates the schedule. Allowed from `Absent` and `Deleted`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` while active and `InvalidSchedule` for a bad
    /// expression, both before any call, or the platform error.
    pub async fn create(&mut self, request: &ScheduleRequest) -> Result<String> {
        if self.lifecycle == ScheduleLifecycle::Active {
            return Err(MonitorError::InvalidTransition(format!(
                "schedule {} is already active; delete it before creating it again",
                self.name
            )));
        }

        let config = schedule_config(request)?;

        info!(
            schedule = %self.name,
            endpoint = %request.endpoint_name,
            expression = %request.expression,
            "Creating monitoring schedule"
        );
        let response = self
            .api
            .create_monitoring_schedule(CreateMonitoringScheduleRequest {
                monitoring_schedule_name: self.name.clone(),
                monitoring_schedule_config: config,
            })
            .await?;

        self.lifecycle = ScheduleLifecycle::Active;
        Ok(response.monitoring_schedule_arn)
    }

    /// Describes the schedule, `None` when the platform does not know it.
    ///
    /// # Errors
    ///
    /// Returns any other platform error.
    pub async fn describe(&self) -> Result<Option<MonitoringSchedule>> {
        let response = self
            .api
            .describe_monitoring_schedule(DescribeMonitoringScheduleRequest {
                monitoring_schedule_name: self.name.clone(),
            })
            .await;

        match response {
            Ok(response) => Ok(Some(to_schedule(response))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the schedule. Only allowed while active.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when not active, or the platform error.
    pub async fn delete(&mut self) -> Result<()> {
        if self.lifecycle != ScheduleLifecycle::Active {
            return Err(MonitorError::InvalidTransition(format!(
                "schedule {} is {}, only an active schedule can be deleted",
                self.name, self.lifecycle
            )));
        }

        info!(schedule = %self.name, "Deleting monitoring schedule");
        self.api
            .delete_monitoring_schedule(DeleteMonitoringScheduleRequest {
                monitoring_schedule_name: self.name.clone(),
            })
            .await?;

        self.lifecycle = ScheduleLifecycle::Deleted;
        Ok(())
    }

    /// Waits until the platform no longer reports the schedule.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or the platform error.
    pub async fn wait_deleted(&self, policy: PollPolicy) -> Result<()> {
        let what = format!("deletion of schedule {}", self.name);
        poll_until(policy, &what, move || async move {
            Ok(match self.describe().await? {
                None => PollStatus::Ready(()),
                Some(schedule) => PollStatus::Pending(schedule.status.to_string()),
            })
        })
        .await
    }

    /// Executions of the schedule, newest first.
    ///
    /// # Errors
    ///
    /// Returns the platform error.
    pub async fn list_executions(&self) -> Result<Vec<MonitoringExecution>> {
        let response = self
            .api
            .list_monitoring_executions(ListMonitoringExecutionsRequest {
                monitoring_schedule_name: Some(self.name.clone()),
                sort_by: Some("ScheduledTime".to_string()),
                sort_order: Some("Descending".to_string()),
                max_results: Some(MAX_EXECUTIONS),
                ..ListMonitoringExecutionsRequest::default()
            })
            .await?;

        let mut executions: Vec<_> = response
            .monitoring_execution_summaries
            .into_iter()
            .map(to_execution)
            .collect();
        executions.sort_by(|a, b| b.scheduled_time.cmp(&a.scheduled_time));

        Ok(executions)
    }
}

fn to_schedule(response: DescribeMonitoringScheduleResponse) -> MonitoringSchedule {
    MonitoringSchedule {
        name: response.monitoring_schedule_name,
        arn: response.monitoring_schedule_arn,
        status: response.monitoring_schedule_status,
        endpoint_name: response.endpoint_name,
        schedule_expression: response
            .monitoring_schedule_config
            .and_then(|config| config.schedule_config)
            .map(|config| config.schedule_expression),
        creation_time: response.creation_time,
        last_execution: response.last_monitoring_execution_summary.map(to_execution),
        failure_reason: response.failure_reason,
    }
}

fn to_execution(summary: MonitoringExecutionSummary) -> MonitoringExecution {
    MonitoringExecution {
        schedule_name: summary.monitoring_schedule_name,
        scheduled_time: summary.scheduled_time,
        status: summary.monitoring_execution_status,
        processing_job_arn: summary.processing_job_arn,
        failure_reason: summary.failure_reason,
    }
}
