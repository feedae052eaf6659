//! Reading what an endpoint captured.

use monitor_structs::{CaptureRecord, S3Uri, capture_prefix, parse_capture_lines};
use tracing::info;

use crate::error::{MonitorError, Result};
use crate::polling::{PollPolicy, PollStatus, poll_until};
use crate::storage::{self, Bucket};

const CAPTURE_EXTENSION: &str = ".jsonl";

/// Capture files of one endpoint variant, oldest first.
///
/// # Errors
///
/// Returns a storage error.
pub async fn list_capture_files(
    store: &Bucket,
    destination: &S3Uri,
    endpoint_name: &str,
    variant_name: &str,
) -> Result<Vec<S3Uri>> {
    let prefix = capture_prefix(destination, endpoint_name, variant_name);
    let files: Vec<S3Uri> = storage::list_objects(store, &prefix)
        .await?
        .into_iter()
        .filter(|uri| uri.key().ends_with(CAPTURE_EXTENSION))
        .collect();

    info!(prefix = %prefix, files = files.len(), "Listed capture files");
    Ok(files)
}

/// Decodes every record in `files`, in order.
///
/// # Errors
///
/// Returns `MalformedArtifact` naming the first file with a bad line.
pub async fn read_capture_records(
    store: &Bucket,
    files: &[S3Uri],
) -> Result<Vec<CaptureRecord>> {
    let mut records = Vec::new();
    for uri in files {
        let text = storage::get_text(store, uri).await?;
        records.extend(parse_capture_lines(&text).map_err(|e| MonitorError::malformed(uri, e))?);
    }
    Ok(records)
}

/// Polls until at least one capture file exists for the endpoint variant.
///
/// # Errors
///
/// Returns `Timeout` if nothing shows up, or a storage error.
pub async fn wait_for_capture(
    store: &Bucket,
    destination: &S3Uri,
    endpoint_name: &str,
    variant_name: &str,
    policy: PollPolicy,
) -> Result<Vec<S3Uri>> {
    let what = format!("capture files of {endpoint_name}");
    poll_until(policy, &what, move || async move {
        let files = list_capture_files(store, destination, endpoint_name, variant_name).await?;
        Ok(if files.is_empty() {
            PollStatus::Pending("no capture files".to_string())
        } else {
            PollStatus::Ready(files)
        })
    })
    .await
}
