//! Rate-limited, signed HTTP client for the SageMaker APIs.

use core::num::NonZeroU32;
use core::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::ApiError;
use super::models::InvokeEndpointOutput;
use crate::signing::{self, Credentials, SigningRequest};

/// Control-plane calls allowed per second
const RATE_LIMIT_PER_SECOND: u32 = 5;

/// Signing name shared by the control plane and the runtime
const SERVICE: &str = "sagemaker";

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";

type RateLimiterType = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Client for one region.
pub struct SageMakerClient {
    client: Client,
    region: String,
    credentials: Credentials,
    limiter: RateLimiterType,
    endpoint_url: Option<String>,
}

impl SageMakerClient {
    /// Creates a client for `region`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(region: impl Into<String>, credentials: Credentials) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        let quota = Quota::per_second(
            NonZeroU32::new(RATE_LIMIT_PER_SECOND).expect("rate limit should be non-zero"),
        );

        Ok(Self {
            client,
            region: region.into(),
            credentials,
            limiter: RateLimiter::direct(quota),
            endpoint_url: None,
        })
    }

    /// Sends every call to `url` (`scheme://host[:port]`) instead of the
    /// regional hosts.
    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Creates a client from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn from_config(config: &config::Config) -> Result<Self, ApiError> {
        let credentials = Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.session_token.clone(),
        );
        let client = Self::new(config.region.clone(), credentials)?;
        Ok(match &config.endpoint_url {
            Some(url) => client.with_endpoint_url(url.as_str()),
            None => client,
        })
    }

    /// Region this client signs for.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Base URL and signed host for a regional `service` host.
    fn target(&self, service: &str) -> (String, String) {
        match &self.endpoint_url {
            Some(url) => {
                let host = url.split_once("://").map_or(url.as_str(), |(_, rest)| rest);
                (url.clone(), host.to_string())
            }
            None => {
                let host = format!("{service}.sagemaker.{}.amazonaws.com", self.region);
                (format!("https://{host}"), host)
            }
        }
    }

    /// Calls control-plane `operation` with a JSON request body.
    ///
    /// The call is made once. Throttling and every other platform error are
    /// returned to the caller.
    ///
    /// # Errors
    ///
    /// Returns the platform's error, a transport failure, or a decode failure.
    pub async fn call<Req, Resp>(&self, operation: &str, request: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request).map_err(|source| ApiError::Encode {
            operation: operation.to_string(),
            source,
        })?;

        let response = self.send_control(operation, &body).await?;

        // Delete operations answer with an empty body.
        let response = if response.is_empty() {
            Bytes::from_static(b"{}")
        } else {
            response
        };

        serde_json::from_slice(&response).map_err(|source| ApiError::Decode {
            operation: operation.to_string(),
            source,
        })
    }

    async fn send_control(&self, operation: &str, body: &[u8]) -> Result<Bytes, ApiError> {
        self.limiter.until_ready().await;

        let (base, host) = self.target("api");
        let target = format!("SageMaker.{operation}");
        let headers = [
            ("content-type", JSON_CONTENT_TYPE),
            ("x-amz-target", target.as_str()),
        ];

        debug!(operation, bytes = body.len(), "Calling control plane");

        let (bytes, _) = self.send_signed(&base, &host, "/", &headers, body).await?;
        Ok(bytes)
    }

    /// Sends one inference request to `endpoint_name`.
    ///
    /// # Errors
    ///
    /// Returns the platform's error (including model errors raised by the
    /// container) or a transport failure.
    pub async fn invoke_endpoint(
        &self,
        endpoint_name: &str,
        content_type: &str,
        accept: &str,
        body: Bytes,
    ) -> Result<InvokeEndpointOutput, ApiError> {
        let (base, host) = self.target("runtime");
        let path = format!("/endpoints/{endpoint_name}/invocations");
        let headers = [("content-type", content_type), ("accept", accept)];

        debug!(endpoint = endpoint_name, bytes = body.len(), "Invoking endpoint");

        let (body, content_type) = self.send_signed(&base, &host, &path, &headers, &body).await?;

        Ok(InvokeEndpointOutput { body, content_type })
    }

    async fn send_signed(
        &self,
        base: &str,
        host: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<(Bytes, Option<String>), ApiError> {
        let signed = signing::sign(
            &self.credentials,
            &self.region,
            SERVICE,
            &SigningRequest {
                method: "POST",
                host,
                path,
                query: "",
                headers,
                payload: body,
            },
            Utc::now(),
        );

        let mut request = self.client.post(format!("{base}{path}"));
        for &(name, value) in headers {
            request = request.header(name, value);
        }
        for (name, value) in signed.pairs() {
            request = request.header(name, value);
        }

        let response = request.body(body.to_vec()).send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &bytes));
        }

        Ok((bytes, content_type))
    }
}
