//! Monitoring schedule commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use model_monitor::polling::PollPolicy;
use model_monitor::reports::format_table;
use model_monitor::schedule::{ScheduleManager, ScheduleRequest};
use monitor_structs::{CONSTRAINTS_FILE_NAME, InstanceSpec, STATISTICS_FILE_NAME, ScheduleExpression};

use super::Context;

#[derive(Subcommand, Debug, Clone)]
pub enum ScheduleCommand {
    /// Create a schedule monitoring an endpoint
    Create(CreateArgs),

    /// Show a schedule and its last execution
    Describe {
        #[arg(short, long)]
        name: String,
    },

    /// Delete a schedule
    Delete {
        #[arg(short, long)]
        name: String,

        /// Wait until the platform has removed it
        #[arg(long)]
        wait: bool,
    },

    /// List executions, newest first
    Executions {
        #[arg(short, long)]
        name: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    #[arg(short, long)]
    pub name: String,

    #[arg(short, long)]
    pub endpoint: String,

    /// `hourly`, `daily:H`, `every:N[@S]` or a `cron(...)` expression
    #[arg(long, default_value = "hourly")]
    pub expression: ScheduleExpression,

    #[arg(long, default_value = "ml.m5.xlarge")]
    pub instance_type: String,

    #[arg(long)]
    pub publish_metrics: bool,

    /// Record preprocessor script, uploaded and passed through
    #[arg(long)]
    pub preprocessor: Option<PathBuf>,

    /// Post-analytics processor script, uploaded and passed through
    #[arg(long)]
    pub postprocessor: Option<PathBuf>,
}

/// Creates a schedule against the current baseline.
///
/// # Errors
///
/// Returns an error if the schedule already exists or creation fails.
pub async fn create<'a>(ctx: &'a Context, args: &CreateArgs) -> Result<ScheduleManager<'a>> {
    let (record_preprocessor, post_analytics_processor) = ctx
        .upload_scripts(args.preprocessor.as_deref(), args.postprocessor.as_deref())
        .await?;

    let baseline = ctx.layout.baseline_results();
    let request = ScheduleRequest {
        endpoint_name: args.endpoint.clone(),
        statistics: baseline.join(STATISTICS_FILE_NAME),
        constraints: baseline.join(CONSTRAINTS_FILE_NAME),
        output: ctx.layout.reports(),
        expression: args.expression.clone(),
        image: ctx.analyzer_image()?,
        instance: InstanceSpec {
            instance_type: args.instance_type.clone(),
            instance_count: 1,
        },
        role_arn: ctx.role_arn().to_string(),
        publish_metrics: args.publish_metrics,
        record_preprocessor,
        post_analytics_processor,
        max_runtime_seconds: None,
    };

    let mut schedule = ScheduleManager::attach(&ctx.api, args.name.as_str()).await?;
    let arn = schedule
        .create(&request)
        .await
        .with_context(|| format!("Failed to create schedule {}", args.name))?;
    println!("Created schedule {arn}");

    Ok(schedule)
}

/// Runs a schedule subcommand.
///
/// # Errors
///
/// Returns an error if the platform call fails or the transition is invalid.
pub async fn run(ctx: &Context, command: &ScheduleCommand) -> Result<()> {
    match command {
        ScheduleCommand::Create(args) => {
            create(ctx, args).await?;
        }
        ScheduleCommand::Describe { name } => {
            let schedule = ScheduleManager::new(&ctx.api, name.as_str());
            match schedule.describe().await? {
                Some(described) => println!("{}", serde_json::to_string_pretty(&described)?),
                None => println!("Schedule {name} does not exist"),
            }
        }
        ScheduleCommand::Delete { name, wait } => {
            let mut schedule = ScheduleManager::attach(&ctx.api, name.as_str()).await?;
            schedule.delete().await?;
            if *wait {
                schedule.wait_deleted(PollPolicy::ENDPOINT).await?;
            }
            println!("Deleted schedule {name}");
        }
        ScheduleCommand::Executions { name } => {
            let schedule = ScheduleManager::new(&ctx.api, name.as_str());
            let rows: Vec<[String; 4]> = schedule
                .list_executions()
                .await?
                .into_iter()
                .map(|e| {
                    [
                        e.scheduled_time.to_rfc3339(),
                        e.status.to_string(),
                        e.processing_job_arn.unwrap_or_default(),
                        e.failure_reason.unwrap_or_default(),
                    ]
                })
                .collect();

            if rows.is_empty() {
                println!("No executions yet");
            } else {
                println!(
                    "{}",
                    format_table(["scheduled", "status", "processing job", "failure"], &rows)
                );
            }
        }
    }

    Ok(())
}
