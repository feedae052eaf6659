//! The platform operations the monitoring flow depends on.

use async_trait::async_trait;
use bytes::Bytes;

use crate::api::client::SageMakerClient;
use crate::api::error::ApiError;
use crate::api::models::{
    CreateEndpointConfigRequest, CreateEndpointConfigResponse, CreateEndpointRequest,
    CreateEndpointResponse, CreateModelRequest, CreateModelResponse,
    CreateMonitoringScheduleRequest, CreateMonitoringScheduleResponse, CreateProcessingJobRequest,
    CreateProcessingJobResponse, DeleteEndpointConfigRequest, DeleteEndpointRequest,
    DeleteModelRequest, DeleteMonitoringScheduleRequest, DescribeEndpointRequest,
    DescribeEndpointResponse, DescribeMonitoringScheduleRequest,
    DescribeMonitoringScheduleResponse, DescribeProcessingJobRequest,
    DescribeProcessingJobResponse, DescribeTrainingJobRequest, DescribeTrainingJobResponse,
    EmptyResponse, InvokeEndpointOutput, ListMonitoringExecutionsRequest,
    ListMonitoringExecutionsResponse, ListTrainingJobsRequest, ListTrainingJobsResponse,
};

/// Control-plane and runtime calls, one method per platform operation.
#[async_trait]
pub trait SageMakerApi: Send + Sync {
    async fn list_training_jobs(
        &self,
        request: ListTrainingJobsRequest,
    ) -> Result<ListTrainingJobsResponse, ApiError>;

    async fn describe_training_job(
        &self,
        request: DescribeTrainingJobRequest,
    ) -> Result<DescribeTrainingJobResponse, ApiError>;

    async fn create_model(&self, request: CreateModelRequest)
    -> Result<CreateModelResponse, ApiError>;

    async fn create_endpoint_config(
        &self,
        request: CreateEndpointConfigRequest,
    ) -> Result<CreateEndpointConfigResponse, ApiError>;

    async fn create_endpoint(
        &self,
        request: CreateEndpointRequest,
    ) -> Result<CreateEndpointResponse, ApiError>;

    async fn describe_endpoint(
        &self,
        request: DescribeEndpointRequest,
    ) -> Result<DescribeEndpointResponse, ApiError>;

    async fn delete_endpoint(&self, request: DeleteEndpointRequest) -> Result<(), ApiError>;

    async fn delete_endpoint_config(
        &self,
        request: DeleteEndpointConfigRequest,
    ) -> Result<(), ApiError>;

    async fn delete_model(&self, request: DeleteModelRequest) -> Result<(), ApiError>;

    /// Sends one request body to a hosted endpoint.
    async fn invoke_endpoint(
        &self,
        endpoint_name: &str,
        content_type: &str,
        accept: &str,
        body: Bytes,
    ) -> Result<InvokeEndpointOutput, ApiError>;

    async fn create_processing_job(
        &self,
        request: CreateProcessingJobRequest,
    ) -> Result<CreateProcessingJobResponse, ApiError>;

    async fn describe_processing_job(
        &self,
        request: DescribeProcessingJobRequest,
    ) -> Result<DescribeProcessingJobResponse, ApiError>;

    async fn create_monitoring_schedule(
        &self,
        request: CreateMonitoringScheduleRequest,
    ) -> Result<CreateMonitoringScheduleResponse, ApiError>;

    async fn describe_monitoring_schedule(
        &self,
        request: DescribeMonitoringScheduleRequest,
    ) -> Result<DescribeMonitoringScheduleResponse, ApiError>;

    async fn delete_monitoring_schedule(
        &self,
        request: DeleteMonitoringScheduleRequest,
    ) -> Result<(), ApiError>;

    async fn list_monitoring_executions(
        &self,
        request: ListMonitoringExecutionsRequest,
    ) -> Result<ListMonitoringExecutionsResponse, ApiError>;
}

#[async_trait]
impl SageMakerApi for SageMakerClient {
    async fn list_training_jobs(
        &self,
        request: ListTrainingJobsRequest,
    ) -> Result<ListTrainingJobsResponse, ApiError> {
        self.call("ListTrainingJobs", &request).await
    }

    async fn describe_training_job(
        &self,
        request: DescribeTrainingJobRequest,
    ) -> Result<DescribeTrainingJobResponse, ApiError> {
        self.call("DescribeTrainingJob", &request).await
    }

    async fn create_model(
        &self,
        request: CreateModelRequest,
    ) -> Result<CreateModelResponse, ApiError> {
        self.call("CreateModel", &request).await
    }

    async fn create_endpoint_config(
        &self,
        request: CreateEndpointConfigRequest,
    ) -> Result<CreateEndpointConfigResponse, ApiError> {
        self.call("CreateEndpointConfig", &request).await
    }

    async fn create_endpoint(
        &self,
        request: CreateEndpointRequest,
    ) -> Result<CreateEndpointResponse, ApiError> {
        self.call("CreateEndpoint", &request).await
    }

    async fn describe_endpoint(
        &self,
        request: DescribeEndpointRequest,
    ) -> Result<DescribeEndpointResponse, ApiError> {
        self.call("DescribeEndpoint", &request).await
    }

    async fn delete_endpoint(&self, request: DeleteEndpointRequest) -> Result<(), ApiError> {
        self.call::<_, EmptyResponse>("DeleteEndpoint", &request)
            .await
            .map(|_| ())
    }

    async fn delete_endpoint_config(
        &self,
        request: DeleteEndpointConfigRequest,
    ) -> Result<(), ApiError> {
        self.call::<_, EmptyResponse>("DeleteEndpointConfig", &request)
            .await
            .map(|_| ())
    }

    async fn delete_model(&self, request: DeleteModelRequest) -> Result<(), ApiError> {
        self.call::<_, EmptyResponse>("DeleteModel", &request)
            .await
            .map(|_| ())
    }

    async fn invoke_endpoint(
        &self,
        endpoint_name: &str,
        content_type: &str,
        accept: &str,
        body: Bytes,
    ) -> Result<InvokeEndpointOutput, ApiError> {
        Self::invoke_endpoint(self, endpoint_name, content_type, accept, body).await
    }

    async fn create_processing_job(
        &self,
        request: CreateProcessingJobRequest,
    ) -> Result<CreateProcessingJobResponse, ApiError> {
        self.call("CreateProcessingJob", &request).await
    }

    async fn describe_processing_job(
        &self,
        request: DescribeProcessingJobRequest,
    ) -> Result<DescribeProcessingJobResponse, ApiError> {
        self.call("DescribeProcessingJob", &request).await
    }

    async fn create_monitoring_schedule(
        &self,
        request: CreateMonitoringScheduleRequest,
    ) -> Result<CreateMonitoringScheduleResponse, ApiError> {
        self.call("CreateMonitoringSchedule", &request).await
    }

    async fn describe_monitoring_schedule(
        &self,
        request: DescribeMonitoringScheduleRequest,
    ) -> Result<DescribeMonitoringScheduleResponse, ApiError> {
        self.call("DescribeMonitoringSchedule", &request).await
    }

    async fn delete_monitoring_schedule(
        &self,
        request: DeleteMonitoringScheduleRequest,
    ) -> Result<(), ApiError> {
        self.call::<_, EmptyResponse>("DeleteMonitoringSchedule", &request)
            .await
            .map(|_| ())
    }

    async fn list_monitoring_executions(
        &self,
        request: ListMonitoringExecutionsRequest,
    ) -> Result<ListMonitoringExecutionsResponse, ApiError> {
        self.call("ListMonitoringExecutions", &request).await
    }
}
