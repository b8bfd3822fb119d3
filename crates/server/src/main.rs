use std::sync::Arc;
use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mibridge_server::api;
use mibridge_server::state::AppState;
use mibridge_shared::Config;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting mibridge {}", mibridge_server::VERSION);

    // Token problems are fatal here, before anything listens
    let config = Config::load()?;
    let state = Arc::new(AppState::from_config(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(state, shutdown_rx).await {
            error!("API server crashed: {}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal...");

    let _ = shutdown_tx.send(true);
    let _ = api_handle.await;

    info!("mibridge shutdown complete.");
    Ok(())
}
