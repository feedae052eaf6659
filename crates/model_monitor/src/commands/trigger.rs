//! Trigger command - one manual monitoring run over captured traffic.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use model_monitor::polling::PollPolicy;
use model_monitor::trigger::{self, ManualRun, TriggeredRun};
use monitor_structs::{CONSTRAINTS_FILE_NAME, InstanceSpec, S3Uri, STATISTICS_FILE_NAME};

use super::Context;
use super::capture::capture_files;

#[derive(Args, Debug, Clone)]
pub struct TriggerArgs {
    #[arg(short, long)]
    pub endpoint: String,

    /// Captured data to analyze; the hour of the newest capture file when omitted
    #[arg(long)]
    pub captured: Option<S3Uri>,

    /// Schedule name to pass to the analyzer
    #[arg(short, long)]
    pub schedule: Option<String>,

    #[arg(long, default_value = "traffic-manual-monitor")]
    pub name: String,

    #[arg(long, default_value = "ml.m5.xlarge")]
    pub instance_type: String,

    #[arg(long)]
    pub publish_metrics: bool,

    #[arg(long)]
    pub preprocessor: Option<PathBuf>,

    #[arg(long)]
    pub postprocessor: Option<PathBuf>,

    /// Submit the run and return without waiting for its report
    #[arg(long)]
    pub no_wait: bool,
}

/// Hour prefix holding the newest capture file of `endpoint`.
async fn latest_capture_hour(ctx: &Context, endpoint: &str) -> Result<S3Uri> {
    let files = capture_files(ctx, endpoint, false).await?;
    let newest = files
        .iter()
        .max_by(|a, b| a.key().cmp(b.key()))
        .with_context(|| format!("No captured data for endpoint {endpoint}"))?;

    let dir = newest
        .key()
        .rsplit_once('/')
        .map_or("", |(dir, _)| dir);
    Ok(S3Uri::new(newest.bucket(), dir))
}

/// Runs the analyzer once, waiting for it to finish unless `no_wait` is set.
///
/// # Errors
///
/// Returns an error if no captured data exists, an upload fails or the job fails.
pub async fn trigger(ctx: &Context, args: &TriggerArgs) -> Result<TriggeredRun> {
    let captured = match &args.captured {
        Some(captured) => captured.clone(),
        None => latest_capture_hour(ctx, &args.endpoint).await?,
    };

    let (record_preprocessor, post_analytics_processor) = ctx
        .upload_scripts(args.preprocessor.as_deref(), args.postprocessor.as_deref())
        .await?;

    let baseline = ctx.layout.baseline_results();
    let run = ManualRun {
        base_name: args.name.clone(),
        captured,
        statistics: baseline.join(STATISTICS_FILE_NAME),
        constraints: baseline.join(CONSTRAINTS_FILE_NAME),
        output: ctx.layout.reports().join("manual"),
        image: ctx.analyzer_image()?,
        instance: InstanceSpec {
            instance_type: args.instance_type.clone(),
            instance_count: 1,
        },
        role_arn: ctx.role_arn().to_string(),
        publish_metrics: args.publish_metrics,
        endpoint_name: Some(args.endpoint.clone()),
        schedule_name: args.schedule.clone(),
        record_preprocessor,
        post_analytics_processor,
        max_runtime_seconds: None,
    };

    let wait = (!args.no_wait).then_some(PollPolicy::PROCESSING_JOB);
    trigger::run_once(&ctx.api, &run, Utc::now(), wait)
        .await
        .context("Manual monitoring run failed")
}

/// Runs the trigger command.
///
/// # Errors
///
/// Returns an error if the run cannot be submitted or fails.
pub async fn run(ctx: &Context, args: &TriggerArgs) -> Result<()> {
    let triggered = trigger(ctx, args).await?;

    println!("Processing job: {}", triggered.job_name);
    println!("Output:         {}", triggered.output);
    if !args.no_wait {
        println!();
        super::reports::print_violations(ctx, &triggered.output).await?;
    }

    Ok(())
}
