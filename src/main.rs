use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use telemetry_relay::config::RelayConfig;
use telemetry_relay::kernel::relay::Relay;
use telemetry_relay::kernel::time::SystemClock;
use telemetry_relay::services::http;

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let config = RelayConfig::from_env()?;
    tracing::info!(
        stale_after_ms = config.stale_after.as_millis() as u64,
        max_frames = config.max_frames,
        replay_dir = ?config.replay_dir,
        "Telemetry relay booting"
    );

    let relay = Relay::from_config(&config, Arc::new(SystemClock::new()))
        .context("failed to initialize relay")?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::info!("Shutdown requested");
        signal.cancel();
    });

    http::serve(Arc::new(relay), config.bind_addr, shutdown).await
}
