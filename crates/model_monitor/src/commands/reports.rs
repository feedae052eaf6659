//! Reports command - lists, downloads and summarises violation reports.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use model_monitor::MonitorError;
use model_monitor::reports::{self, VIOLATION_HEADERS};
use model_monitor::schedule::ScheduleManager;
use monitor_structs::S3Uri;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct ReportsArgs {
    /// Report prefix to read; defaults to the reports location
    #[arg(short, long, conflicts_with = "schedule")]
    pub prefix: Option<S3Uri>,

    /// Read the latest report written by this schedule
    #[arg(short, long)]
    pub schedule: Option<String>,

    /// Download every report file into this directory
    #[arg(short, long)]
    pub download: Option<PathBuf>,
}

/// Resolves which report prefix the arguments point at.
async fn report_prefix(ctx: &Context, args: &ReportsArgs) -> Result<S3Uri> {
    if let Some(prefix) = &args.prefix {
        return Ok(prefix.clone());
    }

    match &args.schedule {
        Some(name) => {
            let schedule = ScheduleManager::new(&ctx.api, name.as_str());
            reports::latest_report_location(&ctx.api, &schedule)
                .await
                .with_context(|| format!("Failed to find a report of schedule {name}"))
        }
        None => Ok(ctx.layout.reports()),
    }
}

/// Prints the newest violations under `prefix` as a table.
///
/// # Errors
///
/// Returns an error if the violations document cannot be read or parsed.
pub async fn print_violations(ctx: &Context, prefix: &S3Uri) -> Result<()> {
    let report = match reports::read_violations(ctx.store(), prefix).await {
        Ok(report) => report,
        Err(MonitorError::NotFound(_)) => {
            println!("No violations document under {prefix}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let rows = reports::violation_rows(&report);

    if rows.is_empty() {
        println!("No violations");
    } else {
        println!("{}", reports::format_table(VIOLATION_HEADERS, &rows));
    }
    Ok(())
}

/// Runs the reports command.
///
/// # Errors
///
/// Returns an error if no report exists under the resolved prefix.
pub async fn run(ctx: &Context, args: &ReportsArgs) -> Result<()> {
    let prefix = report_prefix(ctx, args).await?;

    let files = reports::list_reports(ctx.store(), &prefix).await?;
    println!("Reports under {prefix}:");
    for file in &files {
        println!("  {file}");
    }

    if let Some(dir) = &args.download {
        let downloaded = reports::download_reports(ctx.store(), &prefix, dir).await?;
        println!("Downloaded {} files to {}", downloaded.len(), dir.display());
    }

    println!();
    print_violations(ctx, &prefix).await
}
