//! Hosts a model package behind an endpoint with data capture.

use chrono::{DateTime, Utc};
use monitor_structs::{
    CaptureConfigError, DataCaptureConfig, EndpointHandle, EndpointStatus, InstanceSpec,
    ModelPackage,
};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::{
    CaptureContentTypeHeader, CaptureOption, ContainerDefinition, CreateEndpointConfigRequest,
    CreateEndpointRequest, CreateModelRequest, DataCaptureConfigRequest,
    DeleteEndpointConfigRequest, DeleteEndpointRequest, DeleteModelRequest,
    DescribeEndpointRequest, DescribeEndpointResponse, ProductionVariant,
};
use tracing::info;

use crate::error::{MonitorError, Result};
use crate::naming::timestamped_name;
use crate::polling::{PollPolicy, PollStatus, poll_until};

/// Everything needed for one deployment.
#[derive(Debug, Clone)]
pub struct DeploymentSpec {
    /// Name prefix shared by the model, endpoint config and endpoint
    pub base_name: String,
    pub package: ModelPackage,
    pub instance: InstanceSpec,
    pub capture: DataCaptureConfig,
    pub role_arn: String,
}

/// Wire form of a capture config, `None` when capture is disabled.
///
/// # Errors
///
/// Returns the validation error of an invalid config.
pub fn capture_request(
    config: &DataCaptureConfig,
) -> Result<Option<DataCaptureConfigRequest>, CaptureConfigError> {
    config.validate()?;
    if !config.enabled {
        return Ok(None);
    }

    let destination = config
        .destination
        .as_ref()
        .ok_or(CaptureConfigError::MissingDestination)?;

    Ok(Some(DataCaptureConfigRequest {
        enable_capture: true,
        initial_sampling_percentage: config.sampling_percentage,
        destination_s3_uri: destination.to_string(),
        capture_options: config
            .capture_modes
            .iter()
            .map(|mode| CaptureOption {
                capture_mode: mode.to_string(),
            })
            .collect(),
        capture_content_type_header: Some(CaptureContentTypeHeader {
            csv_content_types: config.csv_content_types.clone(),
            json_content_types: config.json_content_types.clone(),
        }),
    }))
}

/// Creates the model, endpoint config and endpoint, in that order.
///
/// The capture config is validated before any call. Nothing is rolled back
/// if a later step fails.
///
/// # Errors
///
/// Returns `InvalidCaptureConfig` before touching the platform, or the
/// first platform error.
pub async fn deploy(
    api: &dyn SageMakerApi,
    spec: &DeploymentSpec,
    now: DateTime<Utc>,
) -> Result<EndpointHandle> {
    let data_capture_config = capture_request(&spec.capture)?;

    let name = timestamped_name(&spec.base_name, now);
    let handle = EndpointHandle::uniform(&name);

    info!(model = %handle.model_name, image = %spec.package.image, "Creating model");
    api.create_model(CreateModelRequest {
        model_name: handle.model_name.clone(),
        primary_container: ContainerDefinition {
            image: spec.package.image.clone(),
            model_data_url: spec.package.model_data.to_string(),
            environment: spec.package.environment(),
        },
        execution_role_arn: spec.role_arn.clone(),
    })
    .await?;

    info!(
        endpoint_config = %handle.endpoint_config_name,
        capture = spec.capture.enabled,
        sampling = spec.capture.sampling_percentage,
        "Creating endpoint config"
    );
    api.create_endpoint_config(CreateEndpointConfigRequest {
        endpoint_config_name: handle.endpoint_config_name.clone(),
        production_variants: vec![ProductionVariant {
            variant_name: handle.variant_name.clone(),
            model_name: handle.model_name.clone(),
            initial_instance_count: spec.instance.instance_count,
            instance_type: spec.instance.instance_type.clone(),
            initial_variant_weight: 1.0,
        }],
        data_capture_config,
    })
    .await?;

    info!(endpoint = %handle.endpoint_name, "Creating endpoint");
    api.create_endpoint(CreateEndpointRequest {
        endpoint_name: handle.endpoint_name.clone(),
        endpoint_config_name: handle.endpoint_config_name.clone(),
    })
    .await?;

    Ok(handle)
}

/// Polls until the endpoint is `InService`.
///
/// # Errors
///
/// Returns `JobFailed` if the endpoint fails, or `Timeout`.
pub async fn wait_in_service(
    api: &dyn SageMakerApi,
    endpoint_name: &str,
    policy: PollPolicy,
) -> Result<DescribeEndpointResponse> {
    let what = format!("endpoint {endpoint_name}");

    let endpoint = poll_until(policy, &what, move || async move {
        let endpoint = api
            .describe_endpoint(DescribeEndpointRequest {
                endpoint_name: endpoint_name.to_string(),
            })
            .await?;

        match endpoint.endpoint_status {
            EndpointStatus::InService => Ok(PollStatus::Ready(endpoint)),
            EndpointStatus::Failed | EndpointStatus::UpdateRollbackFailed => {
                Err(MonitorError::JobFailed {
                    resource: format!("endpoint {endpoint_name}"),
                    reason: endpoint
                        .failure_reason
                        .unwrap_or_else(|| endpoint.endpoint_status.to_string()),
                })
            }
            status => Ok(PollStatus::Pending(status.to_string())),
        }
    })
    .await?;

    info!(endpoint = endpoint_name, "Endpoint in service");
    Ok(endpoint)
}

/// Deletes the endpoint, its config and the model, in that order.
///
/// # Errors
///
/// Stops at the first platform error.
pub async fn teardown(api: &dyn SageMakerApi, handle: &EndpointHandle) -> Result<()> {
    info!(endpoint = %handle.endpoint_name, "Deleting endpoint");
    api.delete_endpoint(DeleteEndpointRequest {
        endpoint_name: handle.endpoint_name.clone(),
    })
    .await?;

    info!(endpoint_config = %handle.endpoint_config_name, "Deleting endpoint config");
    api.delete_endpoint_config(DeleteEndpointConfigRequest {
        endpoint_config_name: handle.endpoint_config_name.clone(),
    })
    .await?;

    info!(model = %handle.model_name, "Deleting model");
    api.delete_model(DeleteModelRequest {
        model_name: handle.model_name.clone(),
    })
    .await?;

    Ok(())
}
