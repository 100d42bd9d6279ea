//! drift-gateway entry point.

use std::path::PathBuf;

use clap::Parser;

use drift_gateway::config::{load_config, ObservabilityConfig};
use drift_gateway::lifecycle::startup;
use drift_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "drift-gateway")]
#[command(about = "Passthrough REST gateway for the Orion Drift API", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = load_config(args.config.as_deref());
    let fallback = ObservabilityConfig::default();
    logging::init(loaded.as_ref().map(|c| &c.observability).unwrap_or(&fallback));

    tracing::info!("drift-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Configuration rejected, not starting");
            return Err(e.into());
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.base_url,
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
