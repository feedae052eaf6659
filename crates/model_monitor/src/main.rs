//! Model monitor CLI.
//!
//! Deploys the traffic classifier with request capture and runs data-quality
//! monitoring against it.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;

use commands::Context;
use commands::baseline::{BaselineArgs, ConstraintsArgs};
use commands::capture::CaptureArgs;
use commands::deploy::{DeployArgs, TeardownArgs};
use commands::invoke::{InvokeArgs, TrafficArgs};
use commands::locate::LocateArgs;
use commands::reports::ReportsArgs;
use commands::schedule::ScheduleCommand;
use commands::trigger::TriggerArgs;
use commands::walkthrough::WalkthroughArgs;

/// Model monitor
#[derive(Parser)]
#[command(name = "model-monitor")]
#[command(about = "Data-quality monitoring for the hosted traffic classifier")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to this file
    #[arg(long, env = "MONITOR_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the latest completed training job and its artifact
    Locate(LocateArgs),

    /// Deploy the classifier behind an endpoint with data capture
    Deploy(DeployArgs),

    /// Classify rows of a dataset through an endpoint
    Invoke(InvokeArgs),

    /// Baseline a validation dataset
    Baseline(BaselineArgs),

    /// Show or edit the baseline's monitoring constraints
    Constraints(ConstraintsArgs),

    /// Send generated traffic to an endpoint
    Traffic(TrafficArgs),

    /// Manage monitoring schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },

    /// Run the analyzer once over captured traffic
    Trigger(TriggerArgs),

    /// Show what an endpoint has captured
    Capture(CaptureArgs),

    /// List, download and summarise violation reports
    Reports(ReportsArgs),

    /// Delete an endpoint with its config and model
    Teardown(TeardownArgs),

    /// Run the whole flow from deployment to teardown
    Walkthrough(WalkthroughArgs),
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_thread_names(false)
                    .with_ansi(false)
                    .with_writer(file),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_ref())?;

    let ctx = Context::from_env()?;
    info!(region = %ctx.api.region(), root = %ctx.layout.root(), "Model monitor starting");

    match cli.command {
        Commands::Locate(args) => commands::locate::run(&ctx, &args).await?,
        Commands::Deploy(args) => commands::deploy::run(&ctx, &args).await?,
        Commands::Invoke(args) => commands::invoke::run(&ctx, &args).await?,
        Commands::Baseline(args) => commands::baseline::run(&ctx, &args).await?,
        Commands::Constraints(args) => commands::baseline::run_constraints(&ctx, &args).await?,
        Commands::Traffic(args) => commands::invoke::run_traffic(&ctx, &args).await?,
        Commands::Schedule { command } => commands::schedule::run(&ctx, &command).await?,
        Commands::Trigger(args) => commands::trigger::run(&ctx, &args).await?,
        Commands::Capture(args) => commands::capture::run(&ctx, &args).await?,
        Commands::Reports(args) => commands::reports::run(&ctx, &args).await?,
        Commands::Teardown(args) => commands::deploy::run_teardown(&ctx, &args).await?,
        Commands::Walkthrough(args) => {
            Box::pin(commands::walkthrough::run(&ctx, &args)).await?;
        }
    }

    Ok(())
}
