//! Common structs shared across the model monitoring crates.
//!
//! Everything here describes resources owned by the hosting platform:
//! training jobs, endpoints, capture records, baselines, schedules and the
//! reports they produce. Nothing in this crate talks to the platform.

mod baseline;
mod capture;
mod endpoint;
mod features;
mod processing;
mod s3_uri;
mod schedule;
mod training_job;
mod violations;

pub use baseline::*;
pub use capture::*;
pub use endpoint::*;
pub use features::*;
pub use processing::*;
pub use s3_uri::*;
pub use schedule::*;
pub use training_job::*;
pub use violations::*;
