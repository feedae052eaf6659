//! Signed client for the SageMaker control plane and runtime.
//!
//! Control-plane operations speak AWS JSON 1.1 (`X-Amz-Target:
//! SageMaker.<Operation>`); inference goes to the runtime host. Both are
//! signed with Signature Version 4. The [`SageMakerApi`] trait is the seam the
//! monitoring flow is written against, so tests can swap in a fake platform.

pub mod api;
mod platform;
pub mod signing;

pub use api::client::SageMakerClient;
pub use api::error::ApiError;
pub use api::models;
pub use platform::SageMakerApi;
pub use signing::Credentials;
