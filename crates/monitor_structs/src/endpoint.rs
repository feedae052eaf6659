use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::S3Uri;

/// Production variant every endpoint in this toolkit routes all traffic to.
pub const DEFAULT_VARIANT: &str = "AllTraffic";

/// Endpoint status as reported by the platform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum EndpointStatus {
    OutOfService,
    Creating,
    Updating,
    SystemUpdating,
    RollingBack,
    InService,
    Deleting,
    Failed,
    UpdateRollbackFailed,
}

/// Instance type and count for hosting or processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpec {
    pub instance_type: String,
    pub instance_count: u32,
}

impl Default for InstanceSpec {
    fn default() -> Self {
        Self {
            instance_type: String::from("ml.m5.xlarge"),
            instance_count: 1,
        }
    }
}

/// Inference code shipped next to the model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Program the serving container runs, e.g. `inference.py` or `serve`
    pub program: String,

    /// Location of the packaged source directory (`sourcedir.tar.gz`)
    pub source_dir: S3Uri,
}

/// Everything needed to create a hosted model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPackage {
    /// `model.tar.gz` produced by training
    pub model_data: S3Uri,

    /// Serving container image
    pub image: String,

    /// Optional inference entrypoint
    pub entry_point: Option<EntryPoint>,
}

impl ModelPackage {
    /// Container environment wiring the entrypoint into the serving image.
    #[must_use]
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            "SAGEMAKER_CONTAINER_LOG_LEVEL".to_string(),
            "20".to_string(),
        );

        if let Some(entry_point) = &self.entry_point {
            env.insert("SAGEMAKER_PROGRAM".to_string(), entry_point.program.clone());
            env.insert(
                "SAGEMAKER_SUBMIT_DIRECTORY".to_string(),
                entry_point.source_dir.to_string(),
            );
        }

        env
    }
}

/// Names of every resource created for one deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHandle {
    pub model_name: String,
    pub endpoint_config_name: String,
    pub endpoint_name: String,
    pub variant_name: String,
}

impl EndpointHandle {
    /// Handle for resources that all share one name, as the deployer creates them.
    #[must_use]
    pub fn uniform(name: &str) -> Self {
        Self {
            model_name: name.to_string(),
            endpoint_config_name: name.to_string(),
            endpoint_name: name.to_string(),
            variant_name: DEFAULT_VARIANT.to_string(),
        }
    }
}
