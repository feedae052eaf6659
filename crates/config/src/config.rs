use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use anyhow::Context;
use monitor_structs::S3Uri;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;

/// Default key prefix for every object this toolkit writes.
pub const DEFAULT_PREFIX: &str = "traffic-monitor";

/// Global object store instance for the configured bucket, lazily initialized.
pub static OBJECT_STORE: LazyLock<Arc<dyn ObjectStore>> =
    LazyLock::new(|| build_object_store(&CONFIG).expect("Failed to create object store"));

pub static CONFIG: LazyLock<Config> =
    LazyLock::new(|| Config::from_env().expect("Failed to create config"));

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Platform region, e.g. `us-east-1`
    pub region: String,

    /// Execution role assumed by models, endpoints and processing jobs
    pub role_arn: String,

    /// Bucket holding capture data, baselines and reports
    pub bucket: String,

    /// Key prefix inside the bucket
    pub prefix: String,

    /// Access key used to sign platform requests
    pub access_key_id: String,

    /// Secret key used to sign platform requests
    pub secret_access_key: String,

    /// Session token for temporary credentials
    pub session_token: Option<String>,

    /// Serving container image for the traffic classifier
    pub inference_image: Option<String>,

    /// Analyzer image override for baselining and monitoring jobs
    pub analyzer_image: Option<String>,

    /// Local directory standing in for the bucket
    pub local_store: Option<PathBuf>,

    /// Base URL replacing the regional platform hosts
    pub endpoint_url: Option<String>,
}

impl core::fmt::Debug for Config {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Config")
            .field("region", &self.region)
            .field("role_arn", &self.role_arn)
            .field("bucket", &self.bucket)
            .field("prefix", &self.prefix)
            .field("access_key_id", &self.access_key_id)
            .field("inference_image", &self.inference_image)
            .field("analyzer_image", &self.analyzer_image)
            .field("local_store", &self.local_store)
            .field("endpoint_url", &self.endpoint_url)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `AWS_REGION` (or `AWS_DEFAULT_REGION`): platform region
    /// - `MONITOR_ROLE_ARN`: execution role ARN
    /// - `MONITOR_BUCKET`: bucket for capture data, baselines and reports
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY`: signing credentials
    ///
    /// Optional environment variables:
    /// - `AWS_SESSION_TOKEN`: session token for temporary credentials
    /// - `MONITOR_PREFIX`: key prefix (default: `traffic-monitor`)
    /// - `MONITOR_INFERENCE_IMAGE`: serving container image
    /// - `MONITOR_ANALYZER_IMAGE`: analyzer image override
    /// - `MONITOR_LOCAL_STORE`: use a local directory instead of the bucket
    /// - `MONITOR_ENDPOINT_URL`: send platform calls to this base URL
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        let region = std::env::var("AWS_REGION")
            .or_else(|_| std::env::var("AWS_DEFAULT_REGION"))
            .context("AWS_REGION environment variable not set")?;

        let role_arn = std::env::var("MONITOR_ROLE_ARN")
            .context("MONITOR_ROLE_ARN environment variable not set")?;

        let bucket =
            std::env::var("MONITOR_BUCKET").context("MONITOR_BUCKET environment variable not set")?;

        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .context("AWS_ACCESS_KEY_ID environment variable not set")?;

        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;

        Ok(Self {
            region,
            role_arn,
            bucket,
            prefix: std::env::var("MONITOR_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            access_key_id,
            secret_access_key,
            session_token: std::env::var("AWS_SESSION_TOKEN").ok(),
            inference_image: std::env::var("MONITOR_INFERENCE_IMAGE").ok(),
            analyzer_image: std::env::var("MONITOR_ANALYZER_IMAGE").ok(),
            local_store: std::env::var("MONITOR_LOCAL_STORE").ok().map(PathBuf::from),
            endpoint_url: std::env::var("MONITOR_ENDPOINT_URL").ok(),
        })
    }

    /// Locations derived from the bucket and prefix.
    #[must_use]
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.bucket, &self.prefix)
    }
}

/// Every S3 location the monitoring flow reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: S3Uri,
}

impl StorageLayout {
    /// Layout rooted at `s3://{bucket}/{prefix}`.
    #[must_use]
    pub fn new(bucket: &str, prefix: &str) -> Self {
        Self {
            root: S3Uri::new(bucket, prefix),
        }
    }

    /// Root of the layout.
    #[must_use]
    pub const fn root(&self) -> &S3Uri {
        &self.root
    }

    /// Endpoint capture destination.
    #[must_use]
    pub fn data_capture(&self) -> S3Uri {
        self.root.join("datacapture")
    }

    /// Reference dataset uploaded for baselining.
    #[must_use]
    pub fn baseline_dataset(&self) -> S3Uri {
        self.root.join("baselining/data/validation.csv")
    }

    /// Output of the baselining job.
    #[must_use]
    pub fn baseline_results(&self) -> S3Uri {
        self.root.join("baselining/results")
    }

    /// Output of scheduled and manual monitoring runs.
    #[must_use]
    pub fn reports(&self) -> S3Uri {
        self.root.join("reports")
    }

    /// Uploaded inference code and pre/post-processing scripts.
    #[must_use]
    pub fn code(&self) -> S3Uri {
        self.root.join("code")
    }
}

/// Builds the object store for the configured bucket.
///
/// Uses the local directory from `MONITOR_LOCAL_STORE` when set, otherwise
/// the S3 bucket with credentials taken from the environment.
///
/// # Errors
///
/// Returns an error if the store cannot be created.
pub fn build_object_store(config: &Config) -> anyhow::Result<Arc<dyn ObjectStore>> {
    if let Some(base_path) = &config.local_store {
        std::fs::create_dir_all(base_path).context("Failed to create local store directory")?;

        let store = LocalFileSystem::new_with_prefix(base_path)
            .context("Failed to create local object store")?;
        return Ok(Arc::new(store));
    }

    let store = AmazonS3Builder::from_env()
        .with_bucket_name(&config.bucket)
        .with_region(&config.region)
        .build()
        .context("Failed to create S3 object store")?;

    Ok(Arc::new(store))
}
