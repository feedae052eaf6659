//! Capture command - shows what an endpoint recorded.

use anyhow::Result;
use clap::Args;
use model_monitor::capture;
use model_monitor::polling::PollPolicy;
use monitor_structs::{DEFAULT_VARIANT, S3Uri};

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct CaptureArgs {
    #[arg(short, long)]
    pub endpoint: String,

    /// Wait until the first capture file shows up
    #[arg(long)]
    pub wait: bool,

    /// Number of records to print
    #[arg(long, default_value = "5")]
    pub show: usize,
}

/// Lists the capture files of an endpoint, waiting for them when asked.
///
/// # Errors
///
/// Returns an error if listing fails or, when waiting, nothing is captured in time.
pub async fn capture_files(ctx: &Context, endpoint: &str, wait: bool) -> Result<Vec<S3Uri>> {
    let destination = ctx.layout.data_capture();
    let files = if wait {
        capture::wait_for_capture(
            ctx.store(),
            &destination,
            endpoint,
            DEFAULT_VARIANT,
            PollPolicy::CAPTURE,
        )
        .await?
    } else {
        capture::list_capture_files(ctx.store(), &destination, endpoint, DEFAULT_VARIANT).await?
    };
    Ok(files)
}

/// Runs the capture command.
///
/// # Errors
///
/// Returns an error if the capture files cannot be listed or decoded.
pub async fn run(ctx: &Context, args: &CaptureArgs) -> Result<()> {
    let files = capture_files(ctx, &args.endpoint, args.wait).await?;
    if files.is_empty() {
        println!("No capture files for {} yet", args.endpoint);
        return Ok(());
    }

    println!("Capture files:");
    for file in &files {
        println!("  {file}");
    }

    let records = capture::read_capture_records(ctx.store(), &files).await?;
    println!("\n{} records captured", records.len());
    for record in records.iter().take(args.show) {
        println!("\n{}", record.event_metadata.event_id);
        println!("  input:  {}", record.input_data().unwrap_or("-"));
        println!("  output: {}", record.output_data().unwrap_or("-"));
    }

    Ok(())
}
