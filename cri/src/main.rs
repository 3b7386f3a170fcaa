//! cri-envcheck binary.
//!
//! Connects to a CRI runtime, runs the environment check, and exits
//! non-zero if any forward step fails.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cri_envcheck::{Lifecycle, RuntimeClient};
use cri_envcheck_core::config::{CheckConfig, DEFAULT_ENDPOINT};
use cri_envcheck_core::error::Result;

/// Verify a CRI runtime passes a large environment into containers
#[derive(Parser, Debug)]
#[command(name = "cri-envcheck")]
struct Args {
    /// CRI runtime endpoint.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = CheckConfig::new(args.endpoint);

    if let Err(e) = run(&config).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(config: &CheckConfig) -> Result<()> {
    tracing::info!(endpoint = %config.endpoint, "Starting CRI environment check");

    let client = RuntimeClient::connect(config).await?;
    let mut lifecycle = Lifecycle::new(&client);
    let output = match lifecycle.run_until(shutdown_signal()).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(step) = lifecycle.abandoned_creation() {
                eprintln!("Warning: {step} was abandoned in flight; check the runtime for a leftover resource");
            }
            return Err(e);
        }
    };

    println!(
        "The number of environment variables that have been set is {}",
        output.stdout_trimmed()
    );

    Ok(())
}

/// Resolves on Ctrl-C. If the handler cannot be installed, never resolves.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::warn!("Interrupt received, aborting run");
}
