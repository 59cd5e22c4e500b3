//! Synthetic game producer: N players circling the origin, posted as one
//! batch per tick. Handy for exercising visualization clients without a game.
//! With `SIM_RECORD=true` the whole run is captured as one replay.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use telemetry_relay::kernel::telemetry::{Orientation, Vec3};
use telemetry_relay::services::producer::{RelayClient, WireSample};

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v.trim().parse().with_context(|| format!("invalid {}={:?}", key, v)),
        _ => Ok(default),
    }
}

fn player_at(index: usize, t: f64) -> WireSample {
    let radius = 10.0 + 5.0 * index as f64;
    let speed = 0.5 + 0.1 * index as f64;
    let phase = speed * t + index as f64;
    let (sin, cos) = phase.sin_cos();
    WireSample {
        id: format!("player-{}", index + 1),
        x: radius * cos,
        y: 0.0,
        z: radius * sin,
        velocity: Vec3::new(-radius * speed * sin, 0.0, radius * speed * cos),
        angles: Some(Orientation {
            yaw: phase.to_degrees().rem_euclid(360.0),
            pitch: 0.0,
            roll: 0.0,
        }),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    let url: String = env_or("RELAY_URL", "http://127.0.0.1:3000".to_string())?;
    let players: usize = env_or("SIM_PLAYERS", 4)?;
    let tick_ms: u64 = env_or("SIM_TICK_MS", 100)?;
    let record: bool = env_or("SIM_RECORD", false)?;

    let client = RelayClient::new(url.clone());
    let mut cadence = interval(Duration::from_millis(tick_ms));
    cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::info!(%url, players, tick_ms, record, "Producing synthetic telemetry. Press Ctrl+C to stop.");
    if record {
        client.start_recording().await?;
    }

    let mut t = 0.0_f64;
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = cadence.tick() => {}
        }

        let batch: Vec<WireSample> = (0..players).map(|i| player_at(i, t)).collect();
        match client.send_batch(&batch).await {
            Ok(ack) if ack.skipped > 0 => {
                tracing::warn!(status = %ack.status, count = ack.count, skipped = ack.skipped, "Relay skipped records")
            }
            Ok(ack) => tracing::debug!(status = %ack.status, count = ack.count, "Batch accepted"),
            Err(e) => tracing::warn!("Batch failed: {}", e),
        }
        t += tick_ms as f64 / 1000.0;
    }

    if record {
        client.stop_recording().await?;
    }
    tracing::info!("Producer stopped");
    Ok(())
}
