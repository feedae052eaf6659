//! Data-quality monitoring for the hosted traffic classifier.
//!
//! Deploys the classifier behind an endpoint with request capture, baselines
//! the validation set, and schedules (or manually runs) the platform's
//! analyzer against captured traffic. Each module covers one stage of that
//! flow and talks to the platform only through [`SageMakerApi`] and an
//! [`ObjectStore`](object_store::ObjectStore) bound to the monitoring bucket.
//!
//! [`SageMakerApi`]: sagemaker_client::SageMakerApi

pub mod analyzer;
pub mod baseline;
pub mod capture;
pub mod deployer;
pub mod error;
pub mod inference;
pub mod locator;
pub mod naming;
pub mod polling;
pub mod reports;
pub mod schedule;
pub mod storage;
pub mod traffic;
pub mod trigger;

pub use error::{MonitorError, Result};
