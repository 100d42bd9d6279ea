//! Startup orchestration.
//!
//! Subsystems start in dependency order: metrics, upstream client, server,
//! listener. Traffic is accepted only once everything before it succeeded.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::http::GatewayServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;
use crate::upstream::UpstreamClient;

/// Start the gateway from a validated configuration and serve until a
/// termination signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let client = Arc::new(UpstreamClient::from_config(&config.upstream)?);
    let server = GatewayServer::new(&config, client)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;
    Ok(())
}
