//! Longline - trading decision service entry point
//!
//! 1. Loads configuration from the environment
//! 2. Wires the gateway client in as every external capability
//! 3. Starts the scheduler loop
//! 4. Drains and exits cleanly on SIGINT/SIGTERM

use std::sync::Arc;

use tracing::info;

use longline::{
    DecisionLedger, ExecutionPipeline, GatewayClient, RunnerConfig, Scheduler,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("Starting longline...");

    // A startup error here exits with a non-zero status
    let config = RunnerConfig::from_env()?;
    let gateway_url = std::env::var("GATEWAY_URL")
        .map_err(|_| anyhow::anyhow!("GATEWAY_URL environment variable required"))?;

    info!(
        "Gateway: {}, rotation: {:?}, timeframe: {}",
        gateway_url, config.instruments, config.timeframe
    );

    let client = Arc::new(GatewayClient::new(&gateway_url)?);
    let ledger = Arc::new(DecisionLedger::new(client.clone()));

    let pipeline = Arc::new(ExecutionPipeline::new(
        client.clone(),
        client.clone(),
        client.clone(),
        client,
        ledger.clone(),
        config.risk.clone(),
        config.execution,
    ));

    let mut scheduler = Scheduler::new(
        pipeline,
        ledger,
        config.instruments,
        config.timeframe,
        config.schedule,
    );
    scheduler.start()?;

    wait_for_shutdown().await;

    info!("Shutdown signal received, draining current iteration...");
    scheduler.stop().await;

    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
