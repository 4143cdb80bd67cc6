//! Sentinel Agent - application metric monitoring daemon
//!
//! Accepts metric snapshots over HTTP, runs anomaly detection and threshold
//! rules on a fixed tick, and serves the alert administration API.

use anyhow::Result;
use sentinel_agent::{api, config};
use sentinel_core::{
    health::HealthRegistry,
    AnalysisLoop, ChannelSource, Monitor,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting sentinel-agent");

    let config = config::AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        api_port = config.api_port,
        tick_interval_secs = config.tick_interval_secs,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();

    let monitor = Monitor::new(config.monitor_config());
    monitor
        .logger()
        .log_startup(AGENT_VERSION, monitor.settings().threshold);

    let (ingest, source) = ChannelSource::new();
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let analysis = AnalysisLoop::new(
        monitor.clone(),
        Arc::new(source),
        health_registry.clone(),
        config.loop_config(),
    );
    let loop_handle = tokio::spawn(analysis.run(shutdown_rx));

    let app_state = Arc::new(api::AppState::new(
        monitor.clone(),
        health_registry.clone(),
        ingest,
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            monitor.logger().log_shutdown("SIGINT received");
        }
        result = api_handle => {
            match result {
                Ok(Ok(())) => monitor.logger().log_shutdown("API server stopped"),
                Ok(Err(e)) => {
                    error!(error = %e, "API server failed");
                    monitor.logger().log_shutdown("API server failed");
                }
                Err(e) => {
                    error!(error = %e, "API server task panicked");
                    monitor.logger().log_shutdown("API server task panicked");
                }
            }
        }
    }

    health_registry.set_ready(false).await;
    // The loop may already have stopped on its own
    let _ = shutdown_tx.send(());
    if let Err(e) = loop_handle.await {
        error!(error = %e, "Analysis loop task failed");
    }

    info!("Shutting down");
    Ok(())
}
