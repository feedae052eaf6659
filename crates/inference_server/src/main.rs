//! Serving container for the traffic classifier.
//!
//! Implements the hosting contract: `GET /ping` and `POST /invocations` on
//! port 8080, with model files under `/opt/ml/model`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use burn::backend::NdArray;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use traffic_model::handler::model_fn;

mod routes;

type Backend = NdArray;

/// Traffic classifier inference server
#[derive(Parser)]
#[command(name = "serve")]
#[command(version)]
struct Cli {
    /// Directory holding `model.mpk` and `model.config.json`
    #[arg(long, env = "MODEL_DIR", default_value = "/opt/ml/model")]
    model_dir: PathBuf,

    /// Address to listen on
    #[arg(long, env = "SERVING_ADDR", default_value = "0.0.0.0:8080")]
    addr: SocketAddr,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(model_dir = %cli.model_dir.display(), "Loading model");

    // Keep serving /ping with 503 so the platform reports the load failure.
    let model = match model_fn::<Backend>(&cli.model_dir, Default::default()) {
        Ok(model) => {
            info!(classes = model.config.num_classes, "Model loaded");
            Some(Arc::new(Mutex::new(model)))
        }
        Err(e) => {
            warn!("Failed to load model: {e}");
            None
        }
    };

    let app = routes::router(routes::ServingState { model });

    let listener = TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cli.addr))?;
    info!(addr = %cli.addr, "Inference server listening");

    axum::serve(listener, app)
        .await
        .context("Inference server failed")?;

    Ok(())
}
