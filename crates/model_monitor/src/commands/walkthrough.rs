//! Walkthrough command - the whole monitoring flow, start to finish.
//!
//! Locates the latest model, deploys it with capture, sends clean traffic,
//! baselines the validation set, schedules monitoring, sends perturbed
//! traffic, runs the analyzer once by hand and prints what it found. Every
//! created resource is deleted at the end unless `--keep` is given.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use model_monitor::baseline::{self, ConstraintsEdit};
use model_monitor::deployer;
use model_monitor::polling::PollPolicy;
use model_monitor::traffic::Perturbation;
use monitor_structs::{ComparisonMethod, ScheduleExpression};
use tracing::{info, warn};

use super::Context;
use super::baseline::BaselineArgs;
use super::deploy::DeployArgs;
use super::invoke::TrafficArgs;
use super::locate::LocateArgs;
use super::schedule::CreateArgs;
use super::trigger::TriggerArgs;

#[derive(Args, Debug, Clone)]
pub struct WalkthroughArgs {
    /// Labelled validation CSV used for the baseline and for traffic
    #[arg(short, long)]
    pub dataset: PathBuf,

    #[command(flatten)]
    pub locate: LocateArgs,

    #[arg(short, long, default_value = "traffic-classifier")]
    pub name: String,

    #[arg(long, default_value = "traffic-monitor")]
    pub schedule_name: String,

    /// Requests per traffic burst
    #[arg(long, default_value = "50")]
    pub count: usize,

    #[arg(long, default_value = "100")]
    pub delay_ms: u64,

    /// Perturbation applied to the second burst
    #[arg(long, default_value = "scale:0:10")]
    pub perturb: Perturbation,

    /// Leave the endpoint and schedule running
    #[arg(long)]
    pub keep: bool,
}

/// Runs the walkthrough.
///
/// # Errors
///
/// Returns the first stage error. Resources created before the failure are
/// left in place.
pub async fn run(ctx: &Context, args: &WalkthroughArgs) -> Result<()> {
    let started = Instant::now();

    info!("Step 1: Deploying the latest model with capture");
    let deploy_args = DeployArgs {
        artifact: None,
        locate: args.locate.clone(),
        name: args.name.clone(),
        instance_type: "ml.m5.xlarge".to_string(),
        instance_count: 1,
        sampling: 100,
        no_capture: false,
        program: None,
        source_dir: None,
        wait: true,
    };
    let handle = super::deploy::deploy(ctx, &deploy_args).await?;
    let endpoint = handle.endpoint_name.clone();
    info!(endpoint = %endpoint, "Endpoint in service");

    info!("Step 2: Sending clean traffic");
    let mut traffic = TrafficArgs {
        endpoint: endpoint.clone(),
        dataset: args.dataset.clone(),
        count: args.count,
        delay_ms: args.delay_ms,
        perturb: None,
    };
    let clean = super::invoke::send(ctx, &traffic).await?;
    info!(sent = clean.sent, "Clean traffic sent");

    info!("Step 3: Waiting for captured data");
    let files = super::capture::capture_files(ctx, &endpoint, true).await?;
    info!(files = files.len(), "Capture files present");

    info!("Step 4: Baselining the validation set");
    let baseline_args = BaselineArgs {
        dataset: args.dataset.clone(),
        name: format!("{}-baseline", args.name),
        instance_type: "ml.m5.xlarge".to_string(),
        publish_metrics: false,
        wait: true,
    };
    let run = super::baseline::suggest(ctx, &baseline_args).await?;
    info!(job = %run.job_name, "Baseline ready");

    info!("Step 5: Tightening drift constraints");
    let output = ctx.layout.baseline_results();
    let mut loaded = baseline::load_baseline(ctx.store(), &output).await?;
    baseline::edit_constraints(
        &mut loaded.constraints,
        &ConstraintsEdit {
            comparison_method: Some(ComparisonMethod::Robust),
            comparison_threshold: Some(0.1),
            ..ConstraintsEdit::default()
        },
    );
    baseline::save_constraints(ctx.store(), &output, &loaded.constraints).await?;

    info!("Step 6: Scheduling hourly monitoring");
    let schedule_args = CreateArgs {
        name: args.schedule_name.clone(),
        endpoint: endpoint.clone(),
        expression: ScheduleExpression::Hourly,
        instance_type: "ml.m5.xlarge".to_string(),
        publish_metrics: false,
        preprocessor: None,
        postprocessor: None,
    };
    let mut schedule = super::schedule::create(ctx, &schedule_args).await?;

    info!(perturbation = %args.perturb, "Step 7: Sending perturbed traffic");
    traffic.perturb = Some(args.perturb);
    let perturbed = super::invoke::send(ctx, &traffic).await?;
    info!(sent = perturbed.sent, "Perturbed traffic sent");

    info!("Step 8: Running the analyzer over the captured hour");
    let trigger_args = TriggerArgs {
        endpoint: endpoint.clone(),
        captured: None,
        schedule: Some(args.schedule_name.clone()),
        name: format!("{}-manual-monitor", args.name),
        instance_type: "ml.m5.xlarge".to_string(),
        publish_metrics: false,
        preprocessor: None,
        postprocessor: None,
        no_wait: false,
    };
    let triggered = super::trigger::trigger(ctx, &trigger_args).await?;

    info!("Step 9: Reading violations");
    super::reports::print_violations(ctx, &triggered.output).await?;

    if args.keep {
        warn!(endpoint = %endpoint, schedule = %args.schedule_name, "Leaving resources running");
    } else {
        info!("Step 10: Tearing down");
        schedule.delete().await?;
        schedule.wait_deleted(PollPolicy::ENDPOINT).await?;
        deployer::teardown(&ctx.api, &handle).await?;
    }

    info!(
        duration_secs = started.elapsed().as_secs(),
        "Walkthrough complete"
    );
    Ok(())
}
