pub mod api;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::kernel::relay::Relay;

pub use api::{create_api_routes, router, ApiError, ApiState};

/// Serves the relay on `addr` until `shutdown` is cancelled.
pub async fn serve(relay: Arc<Relay>, addr: SocketAddr, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    let local = listener.local_addr().context("listener has no local address")?;
    info!(addr = %local, "Relay listening");

    axum::serve(listener, router(relay))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;

    info!("Relay stopped");
    Ok(())
}
