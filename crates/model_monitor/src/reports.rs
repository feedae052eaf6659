//! Reading the reports monitoring runs leave behind.

use std::path::{Path, PathBuf};

use monitor_structs::{S3Uri, VIOLATIONS_FILE_NAME, ViolationReport};
use sagemaker_client::SageMakerApi;
use sagemaker_client::models::DescribeProcessingJobRequest;
use tracing::{debug, info};

use crate::error::{MonitorError, Result};
use crate::naming::name_from_arn;
use crate::schedule::ScheduleManager;
use crate::storage::{self, Bucket};

/// Column headers of [`violation_rows`].
pub const VIOLATION_HEADERS: [&str; 3] = ["feature_name", "constraint_check_type", "description"];

/// Every report object under `prefix`, sorted by key.
///
/// # Errors
///
/// Returns `NotFound` when the prefix is empty, or a storage error.
pub async fn list_reports(store: &Bucket, prefix: &S3Uri) -> Result<Vec<S3Uri>> {
    let reports = storage::list_objects(store, prefix).await?;
    if reports.is_empty() {
        return Err(MonitorError::NotFound(format!("reports under {prefix}")));
    }

    info!(prefix = %prefix, reports = reports.len(), "Found reports");
    Ok(reports)
}

/// Downloads every report under `prefix` into `local_dir`.
///
/// # Errors
///
/// Returns `NotFound` when there is nothing to download, or a storage or
/// local file error.
pub async fn download_reports(
    store: &Bucket,
    prefix: &S3Uri,
    local_dir: &Path,
) -> Result<Vec<PathBuf>> {
    list_reports(store, prefix).await?;
    storage::download_prefix(store, prefix, local_dir).await
}

/// Parses a `constraint_violations.json` document read from `path`.
///
/// # Errors
///
/// Returns `MalformedArtifact` naming `path`.
pub fn parse_violations(path: &str, text: &str) -> Result<ViolationReport> {
    serde_json::from_str(text).map_err(|e| MonitorError::malformed(path, e))
}

/// Reads the latest violations document under `prefix`.
///
/// Manual and scheduled runs write under different sub-prefixes, so the
/// newest document is the one written last, not the last key.
///
/// # Errors
///
/// Returns `NotFound` if no run under `prefix` wrote violations, or
/// `MalformedArtifact` if the document does not parse.
pub async fn read_violations(store: &Bucket, prefix: &S3Uri) -> Result<ViolationReport> {
    let newest = storage::list_stored(store, prefix)
        .await?
        .into_iter()
        .filter(|object| object.uri.file_name() == Some(VIOLATIONS_FILE_NAME))
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.uri.cmp(&b.uri))
        })
        .ok_or_else(|| MonitorError::NotFound(format!("{VIOLATIONS_FILE_NAME} under {prefix}")))?;

    let uri = &newest.uri;
    debug!(uri = %uri, modified = %newest.last_modified, "Reading violations");
    let text = storage::get_text(store, uri).await?;
    parse_violations(&uri.to_string(), &text)
}

/// One row per violation, in document order.
#[must_use]
pub fn violation_rows(report: &ViolationReport) -> Vec<[String; 3]> {
    report
        .violations
        .iter()
        .map(|v| {
            [
                v.feature_name.clone(),
                v.constraint_check_type.clone(),
                v.description.clone(),
            ]
        })
        .collect()
}

/// Renders rows as a left-aligned text table with a header rule.
#[must_use]
pub fn format_table<const N: usize>(headers: [&str; N], rows: &[[String; N]]) -> String {
    let mut widths = headers.map(|h| h.chars().count());
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut lines = vec![
        table_line(headers.iter().copied(), &widths),
        table_line(rule.iter().map(String::as_str), &widths),
    ];
    for row in rows {
        lines.push(table_line(row.iter().map(String::as_str), &widths));
    }

    lines.join("\n")
}

fn table_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths.iter().copied())
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Report location of the newest execution of `schedule` that produced one.
///
/// # Errors
///
/// Returns `NotFound` if no execution has a report yet, or the platform error.
pub async fn latest_report_location(
    api: &dyn SageMakerApi,
    schedule: &ScheduleManager<'_>,
) -> Result<S3Uri> {
    let executions = schedule.list_executions().await?;
    let arn = executions
        .iter()
        .filter(|e| e.status.has_report())
        .find_map(|e| e.processing_job_arn.as_deref())
        .ok_or_else(|| {
            MonitorError::NotFound(format!("completed execution of schedule {}", schedule.name()))
        })?;

    let job_name = name_from_arn(arn);
    let job = api
        .describe_processing_job(DescribeProcessingJobRequest {
            processing_job_name: job_name.to_string(),
        })
        .await?;

    let output = job
        .processing_output_config
        .and_then(|config| config.outputs.into_iter().next())
        .ok_or_else(|| MonitorError::NotFound(format!("outputs of processing job {job_name}")))?;

    output
        .s3_output
        .s3_uri
        .parse()
        .map_err(|e| MonitorError::malformed(format!("processing job {job_name}"), e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use object_store::memory::InMemory;

    use super::*;

    const VIOLATIONS: &str = r#"{
        "violations": [
            {"feature_name": "Flow Duration", "constraint_check_type": "data_type_check",
             "description": "Data type match requirement is not met."},
            {"feature_name": "Total Fwd Packets", "constraint_check_type": "baseline_drift_check",
             "description": "Baseline drift distance: 0.42 exceeds threshold: 0.1"}
        ]
    }"#;

    #[test]
    fn test_rows_match_violations() {
        let report = parse_violations("violations.json", VIOLATIONS).unwrap();
        let rows = violation_rows(&report);

        assert_eq!(rows.len(), report.violations.len());
        assert_eq!(rows[1][0], "Total Fwd Packets");
        assert_eq!(rows[1][1], "baseline_drift_check");
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_violations("s3://bucket/r/constraint_violations.json", r#"{"violations": 3}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            MonitorError::MalformedArtifact { ref path, .. } if path.ends_with("constraint_violations.json")
        ));
    }

    #[test]
    fn test_empty_violations() {
        let report = parse_violations("v.json", r#"{"violations": []}"#).unwrap();
        assert!(violation_rows(&report).is_empty());
    }

    #[test]
    fn test_format_table() {
        let rows = [["a".to_string(), "long value".to_string()]];
        let table = format_table(["name", "x"], &rows);

        assert_eq!(table, "name  x\n----  ----------\na     long value");
    }

    #[tokio::test]
    async fn test_read_latest_violations() {
        let store = Bucket::new("bucket", Arc::new(InMemory::new()));
        let prefix = S3Uri::new("bucket", "reports/traffic-ep/schedule");

        storage::put_bytes(
            &store,
            &prefix.join("2024/03/01/07/constraint_violations.json"),
            r#"{"violations": []}"#.into(),
        )
        .await
        .unwrap();
        storage::put_bytes(
            &store,
            &prefix.join("2024/03/01/08/constraint_violations.json"),
            VIOLATIONS.into(),
        )
        .await
        .unwrap();
        storage::put_bytes(&store, &prefix.join("2024/03/01/08/statistics.json"), "{}".into())
            .await
            .unwrap();

        assert_eq!(list_reports(&store, &prefix).await.unwrap().len(), 3);
        let report = read_violations(&store, &prefix).await.unwrap();
        assert_eq!(report.violations.len(), 2);
    }

    #[tokio::test]
    async fn test_no_reports() {
        let store = Bucket::new("bucket", Arc::new(InMemory::new()));
        let err = list_reports(&store, &S3Uri::new("bucket", "reports"))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_newest_violations_win_across_runs() {
        let store = Bucket::new("bucket", Arc::new(InMemory::new()));
        let reports = S3Uri::new("bucket", "reports");

        storage::put_bytes(
            &store,
            &reports.join("traffic-ep/schedule/2024/03/01/08/constraint_violations.json"),
            VIOLATIONS.into(),
        )
        .await
        .unwrap();
        tokio::time::sleep(core::time::Duration::from_millis(20)).await;
        storage::put_bytes(
            &store,
            &reports.join("manual/constraint_violations.json"),
            r#"{"violations": []}"#.into(),
        )
        .await
        .unwrap();

        let report = read_violations(&store, &reports).await.unwrap();
        assert!(report.violations.is_empty());
    }
}
