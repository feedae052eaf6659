//! Locate command - finds the latest trained model artifact.

use anyhow::{Context as _, Result};
use clap::Args;
use model_monitor::locator;
use monitor_structs::TrainingJobRef;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct LocateArgs {
    /// Substring every candidate training job name contains
    #[arg(short, long, default_value = "traffic-classifier")]
    pub job_prefix: String,
}

/// Resolves the latest completed training job.
///
/// # Errors
///
/// Returns an error if no completed job matches.
pub async fn locate(ctx: &Context, args: &LocateArgs) -> Result<TrainingJobRef> {
    locator::latest_completed(&ctx.api, &args.job_prefix)
        .await
        .with_context(|| format!("Failed to locate a training job matching {:?}", args.job_prefix))
}

/// Runs the locate command.
///
/// # Errors
///
/// Returns an error if no completed job matches.
pub async fn run(ctx: &Context, args: &LocateArgs) -> Result<()> {
    let job = locate(ctx, args).await?;

    println!("Training job: {}", job.name);
    println!("Created:      {}", job.creation_time);
    println!("Artifact:     {}", job.artifact);

    Ok(())
}
