//! Deploy and teardown commands.

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Args;
use model_monitor::deployer::{self, DeploymentSpec};
use model_monitor::polling::PollPolicy;
use model_monitor::schedule::ScheduleManager;
use monitor_structs::{
    DataCaptureConfig, EndpointHandle, EntryPoint, InstanceSpec, ModelPackage, S3Uri,
    ScheduleLifecycle,
};
use tracing::info;

use super::Context;
use super::locate::{self, LocateArgs};

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Model artifact to host; the latest training job's artifact when omitted
    #[arg(long)]
    pub artifact: Option<S3Uri>,

    #[command(flatten)]
    pub locate: LocateArgs,

    /// Base name of the model, endpoint config and endpoint
    #[arg(short, long, default_value = "traffic-classifier")]
    pub name: String,

    #[arg(long, default_value = "ml.m5.xlarge")]
    pub instance_type: String,

    #[arg(long, default_value = "1")]
    pub instance_count: u32,

    /// Percentage of requests to capture
    #[arg(long, default_value = "100")]
    pub sampling: u32,

    /// Deploy without data capture
    #[arg(long)]
    pub no_capture: bool,

    /// Inference program inside the packaged source directory
    #[arg(long, requires = "source_dir")]
    pub program: Option<String>,

    /// Packaged inference source (`sourcedir.tar.gz`)
    #[arg(long, requires = "program")]
    pub source_dir: Option<S3Uri>,

    /// Wait until the endpoint is in service
    #[arg(long)]
    pub wait: bool,
}

/// Deploys the classifier and returns the created resource names.
///
/// # Errors
///
/// Returns an error if locating, deploying or waiting fails.
pub async fn deploy(ctx: &Context, args: &DeployArgs) -> Result<EndpointHandle> {
    let model_data = match &args.artifact {
        Some(artifact) => artifact.clone(),
        None => locate::locate(ctx, &args.locate).await?.artifact,
    };

    let entry_point = match (&args.program, &args.source_dir) {
        (Some(program), Some(source_dir)) => Some(EntryPoint {
            program: program.clone(),
            source_dir: source_dir.clone(),
        }),
        _ => None,
    };

    let capture = if args.no_capture {
        DataCaptureConfig::disabled()
    } else {
        DataCaptureConfig::enabled(ctx.layout.data_capture(), args.sampling)
    };

    let spec = DeploymentSpec {
        base_name: args.name.clone(),
        package: ModelPackage {
            model_data,
            image: ctx.inference_image()?,
            entry_point,
        },
        instance: InstanceSpec {
            instance_type: args.instance_type.clone(),
            instance_count: args.instance_count,
        },
        capture,
        role_arn: ctx.role_arn().to_string(),
    };

    let handle = deployer::deploy(&ctx.api, &spec, Utc::now())
        .await
        .context("Failed to deploy endpoint")?;

    if args.wait {
        deployer::wait_in_service(&ctx.api, &handle.endpoint_name, PollPolicy::ENDPOINT).await?;
    }

    Ok(handle)
}

/// Runs the deploy command.
///
/// # Errors
///
/// Returns an error if the deployment fails.
pub async fn run(ctx: &Context, args: &DeployArgs) -> Result<()> {
    let handle = deploy(ctx, args).await?;

    println!("Endpoint:        {}", handle.endpoint_name);
    println!("Endpoint config: {}", handle.endpoint_config_name);
    println!("Model:           {}", handle.model_name);

    Ok(())
}

#[derive(Args, Debug, Clone)]
pub struct TeardownArgs {
    /// Endpoint to delete together with its config and model
    #[arg(short, long)]
    pub endpoint: String,

    /// Monitoring schedule to delete first
    #[arg(short, long)]
    pub schedule: Option<String>,
}

/// Runs the teardown command.
///
/// # Errors
///
/// Returns an error if a deletion fails.
pub async fn run_teardown(ctx: &Context, args: &TeardownArgs) -> Result<()> {
    if let Some(name) = &args.schedule {
        let mut schedule = ScheduleManager::attach(&ctx.api, name.as_str()).await?;
        if schedule.lifecycle() == ScheduleLifecycle::Active {
            schedule.delete().await?;
            schedule.wait_deleted(PollPolicy::ENDPOINT).await?;
        } else {
            info!(schedule = %name, "Schedule does not exist, skipping");
        }
    }

    deployer::teardown(&ctx.api, &EndpointHandle::uniform(&args.endpoint))
        .await
        .with_context(|| format!("Failed to tear down endpoint {}", args.endpoint))?;

    println!("Deleted endpoint {}", args.endpoint);
    Ok(())
}
