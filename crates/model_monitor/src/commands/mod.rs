//! CLI command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use config::{CONFIG, OBJECT_STORE, StorageLayout};
use model_monitor::analyzer;
use model_monitor::storage::{self, Bucket};
use monitor_structs::S3Uri;
use sagemaker_client::SageMakerClient;

pub mod baseline;
pub mod capture;
pub mod deploy;
pub mod invoke;
pub mod locate;
pub mod reports;
pub mod schedule;
pub mod trigger;
pub mod walkthrough;

/// Clients and locations shared by every command.
pub struct Context {
    pub api: SageMakerClient,
    pub store: Bucket,
    pub layout: StorageLayout,
}

impl Context {
    /// Builds the context from the environment configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform client cannot be created.
    pub fn from_env() -> Result<Self> {
        let api = SageMakerClient::from_config(&CONFIG).context("Failed to create platform client")?;

        Ok(Self {
            api,
            store: Bucket::new(CONFIG.bucket.as_str(), Arc::clone(&OBJECT_STORE)),
            layout: CONFIG.layout(),
        })
    }

    pub const fn store(&self) -> &Bucket {
        &self.store
    }

    pub fn role_arn(&self) -> &str {
        &CONFIG.role_arn
    }

    /// Analyzer image for the configured region.
    pub fn analyzer_image(&self) -> Result<String> {
        Ok(analyzer::analyzer_image(
            self.api.region(),
            CONFIG.analyzer_image.as_deref(),
        )?)
    }

    /// Serving image for the classifier.
    pub fn inference_image(&self) -> Result<String> {
        CONFIG
            .inference_image
            .clone()
            .context("MONITOR_INFERENCE_IMAGE environment variable not set")
    }

    /// Uploads a local hook script under the code prefix and returns its location.
    pub async fn upload_script(&self, path: &Path) -> Result<S3Uri> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("Script path {} has no file name", path.display()))?;
        let uri = self.layout.code().join(file_name);

        storage::upload_file(self.store(), path, &uri)
            .await
            .with_context(|| format!("Failed to upload {}", path.display()))?;
        Ok(uri)
    }

    /// Uploads both optional hook scripts.
    pub async fn upload_scripts(
        &self,
        preprocessor: Option<&Path>,
        postprocessor: Option<&Path>,
    ) -> Result<(Option<S3Uri>, Option<S3Uri>)> {
        let preprocessor = match preprocessor {
            Some(path) => Some(self.upload_script(path).await?),
            None => None,
        };
        let postprocessor = match postprocessor {
            Some(path) => Some(self.upload_script(path).await?),
            None => None,
        };
        Ok((preprocessor, postprocessor))
    }
}
