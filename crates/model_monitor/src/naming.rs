//! Platform resource names.

use chrono::{DateTime, Utc};

/// Longest name the platform accepts for models, endpoints, jobs and schedules.
pub const MAX_NAME_LEN: usize = 63;

/// `{base}-{yyyy-mm-dd-hh-mm-ss}`, shortening `base` so the result fits.
///
/// Characters other than ASCII alphanumerics and `-` are replaced by `-`.
#[must_use]
pub fn timestamped_name(base: &str, now: DateTime<Utc>) -> String {
    let suffix = now.format("%Y-%m-%d-%H-%M-%S").to_string();
    let budget = MAX_NAME_LEN - suffix.len() - 1;

    let base: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .take(budget)
        .collect();
    let base = base.trim_end_matches('-');

    if base.is_empty() {
        suffix
    } else {
        format!("{base}-{suffix}")
    }
}

/// Last path segment of a resource ARN, e.g. the job name of a processing job ARN.
#[must_use]
pub fn name_from_arn(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}
