//! discovery-service - resolves queued discovery requests in the background
//!
//! Loads the TOML configuration, opens the database and runs the trigger loop
//! until Ctrl+C or SIGTERM.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use core_runtime::logging::init_logging;
use core_runtime::ServiceConfig;
use core_service::DiscoveryService;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Command-line arguments for discovery-service
#[derive(Parser, Debug)]
#[command(name = "discovery-service")]
#[command(about = "Resolves queued artist discovery requests against the metadata service")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "discovery.toml", env = "DISCOVERY_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ServiceConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;
    init_logging(config.logging.clone()).context("Failed to initialize logging")?;

    info!(
        config = %args.config.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Starting discovery-service"
    );

    let service = DiscoveryService::bootstrap(&config)
        .await
        .context("Failed to initialize discovery service")?;

    let shutdown = CancellationToken::new();
    let trigger_loop = service.spawn_trigger_loop(shutdown.clone());

    shutdown_signal().await?;
    shutdown.cancel();
    trigger_loop.await.context("Trigger loop panicked")?;

    service.close().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install signal handler")?
            .recv()
            .await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("Received Ctrl+C, shutting down");
        }
        result = terminate => {
            result?;
            info!("Received terminate signal, shutting down");
        }
    }

    Ok(())
}
