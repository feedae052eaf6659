//! Invoke and traffic commands.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context as _, Result};
use clap::Args;
use model_monitor::inference;
use model_monitor::traffic::{self, Perturbation, TrafficPlan, TrafficSummary};
use tracing::info;
use traffic_model::label_name;

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct InvokeArgs {
    #[arg(short, long)]
    pub endpoint: String,

    /// Labelled CSV dataset (header row, label first)
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Number of rows to classify, from the top of the dataset
    #[arg(short, long, default_value = "1")]
    pub count: usize,
}

/// Runs the invoke command.
///
/// # Errors
///
/// Returns an error if the dataset cannot be read or a request fails.
pub async fn run(ctx: &Context, args: &InvokeArgs) -> Result<()> {
    let rows = traffic::load_rows(&args.dataset).await?;
    let rows = &rows[..args.count.min(rows.len())];

    let labels = inference::predict_many(&ctx.api, &args.endpoint, rows)
        .await
        .with_context(|| format!("Failed to invoke endpoint {}", args.endpoint))?;

    for (i, label) in labels.iter().enumerate() {
        println!(
            "row {i}: class {label} ({})",
            label_name(*label).unwrap_or("unknown")
        );
    }

    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct TrafficArgs {
    #[arg(short, long)]
    pub endpoint: String,

    /// Labelled CSV dataset (header row, label first)
    #[arg(short, long)]
    pub dataset: PathBuf,

    /// Number of requests to send
    #[arg(short, long, default_value = "100")]
    pub count: usize,

    /// Pause between requests in milliseconds
    #[arg(long, default_value = "500")]
    pub delay_ms: u64,

    /// Feature perturbation: `scale:F:X`, `offset:F:X`, `constant:F:X` or `negate:F`
    #[arg(short, long)]
    pub perturb: Option<Perturbation>,
}

/// Sends the requested traffic.
///
/// # Errors
///
/// Returns an error if the dataset cannot be read.
pub async fn send(ctx: &Context, args: &TrafficArgs) -> Result<TrafficSummary> {
    let rows = traffic::load_rows(&args.dataset).await?;
    let plan = TrafficPlan {
        count: args.count,
        delay: Duration::from_millis(args.delay_ms),
        perturbation: args.perturb,
    };

    Ok(traffic::generate(&ctx.api, &args.endpoint, &rows, &plan).await?)
}

/// Runs the traffic command.
///
/// # Errors
///
/// Returns an error if the dataset cannot be read.
pub async fn run_traffic(ctx: &Context, args: &TrafficArgs) -> Result<()> {
    let summary = send(ctx, args).await?;

    println!("Sent {} requests", summary.sent);
    for (label, count) in summary.per_class.iter().enumerate() {
        if *count == 0 {
            continue;
        }
        let name = u32::try_from(label)
            .ok()
            .and_then(label_name)
            .unwrap_or("unknown");
        println!("  {name:<28} {count}");
    }

    info!(endpoint = %args.endpoint, "Traffic run complete");
    Ok(())
}
