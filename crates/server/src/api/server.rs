use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use super::routes::create_router;
use crate::state::AppState;

pub async fn start_server(state: Arc<AppState>, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
    let addr = state.config.bind_addr.clone();

    let app = create_router()
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("mibridge listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_rx))
        .await?;

    Ok(())
}

async fn shutdown_signal(mut shutdown_rx: watch::Receiver<bool>) {
    while !*shutdown_rx.borrow() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }
    info!("Shutting down API server...");
}
