//! Baseline and constraints commands.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use model_monitor::baseline::{self, BaselineJob, BaselineRun, ConstraintsEdit};
use model_monitor::polling::PollPolicy;
use model_monitor::reports::format_table;
use model_monitor::storage;
use monitor_structs::{ComparisonMethod, DatasetFormat, InstanceSpec, Statistics};

use super::Context;

#[derive(Args, Debug, Clone)]
pub struct BaselineArgs {
    /// Local validation dataset to upload and baseline
    #[arg(short, long)]
    pub dataset: PathBuf,

    #[arg(short, long, default_value = "traffic-baseline")]
    pub name: String,

    #[arg(long, default_value = "ml.m5.xlarge")]
    pub instance_type: String,

    /// Publish analyzer metrics
    #[arg(long)]
    pub publish_metrics: bool,

    /// Wait for the job and print a summary of the statistics
    #[arg(long)]
    pub wait: bool,
}

/// Uploads the dataset and submits the baselining job.
///
/// # Errors
///
/// Returns an error if the upload or the job fails.
pub async fn suggest(ctx: &Context, args: &BaselineArgs) -> Result<BaselineRun> {
    let dataset = ctx.layout.baseline_dataset();
    storage::upload_file(ctx.store(), &args.dataset, &dataset)
        .await
        .with_context(|| format!("Failed to upload {}", args.dataset.display()))?;

    let job = BaselineJob {
        base_name: args.name.clone(),
        dataset,
        format: DatasetFormat::csv_with_header(),
        output: ctx.layout.baseline_results(),
        image: ctx.analyzer_image()?,
        instance: InstanceSpec {
            instance_type: args.instance_type.clone(),
            instance_count: 1,
        },
        role_arn: ctx.role_arn().to_string(),
        publish_metrics: args.publish_metrics,
        max_runtime_seconds: None,
    };

    let wait = args.wait.then_some(PollPolicy::PROCESSING_JOB);
    Ok(baseline::suggest_baseline(&ctx.api, &job, Utc::now(), wait).await?)
}

/// Runs the baseline command.
///
/// # Errors
///
/// Returns an error if the job fails or its output cannot be read.
pub async fn run(ctx: &Context, args: &BaselineArgs) -> Result<()> {
    let run = suggest(ctx, args).await?;
    println!("Baselining job: {}", run.job_name);
    println!("Statistics:     {}", run.statistics);
    println!("Constraints:    {}", run.constraints);

    if args.wait {
        let baseline = baseline::load_baseline(ctx.store(), &ctx.layout.baseline_results()).await?;
        print_summary(&baseline.statistics);
    }

    Ok(())
}

fn print_summary(statistics: &Statistics) {
    let cell = |value: Option<f64>| value.map(|v| format!("{v:.4}")).unwrap_or_default();
    let rows: Vec<[String; 4]> = baseline::summarize(statistics)
        .into_iter()
        .map(|f| [f.name, cell(f.mean), cell(f.min), cell(f.max)])
        .collect();

    println!("\nItems: {}", statistics.dataset.item_count);
    println!("{}", format_table(["feature", "mean", "min", "max"], &rows));
}

#[derive(Args, Debug, Clone)]
pub struct ConstraintsArgs {
    /// Drift comparison method (`simple` or `robust`)
    #[arg(long)]
    pub comparison_method: Option<ComparisonMethod>,

    /// Drift distance above which a feature is reported
    #[arg(long)]
    pub comparison_threshold: Option<f64>,

    #[arg(long)]
    pub perform_comparison: Option<bool>,

    #[arg(long)]
    pub evaluate_constraints: Option<bool>,

    #[arg(long)]
    pub emit_metrics: Option<bool>,
}

impl ConstraintsArgs {
    fn edit(&self) -> ConstraintsEdit {
        ConstraintsEdit {
            comparison_method: self.comparison_method,
            comparison_threshold: self.comparison_threshold,
            perform_comparison: self.perform_comparison,
            evaluate_constraints: self.evaluate_constraints,
            emit_metrics: self.emit_metrics,
        }
    }
}

/// Runs the constraints command: edits the baseline's constraints in place.
///
/// # Errors
///
/// Returns an error if the constraints cannot be read or written.
pub async fn run_constraints(ctx: &Context, args: &ConstraintsArgs) -> Result<()> {
    let output = ctx.layout.baseline_results();
    let mut loaded = baseline::load_baseline(ctx.store(), &output)
        .await
        .context("Failed to load baseline")?;

    let edit = args.edit();
    if !edit.is_empty() {
        baseline::edit_constraints(&mut loaded.constraints, &edit);
        baseline::save_constraints(ctx.store(), &output, &loaded.constraints).await?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&loaded.constraints.monitoring_config)?
    );
    Ok(())
}
