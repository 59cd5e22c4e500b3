use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::kernel::telemetry::{Orientation, Vec3};

/// One record in the relay's batch ingest shape.
#[derive(Debug, Clone, Serialize)]
pub struct WireSample {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub velocity: Vec3,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angles: Option<Orientation>,
}

#[derive(Serialize)]
struct BatchRequest<'a> {
    players: &'a [WireSample],
}

#[derive(Debug, Deserialize)]
pub struct IngestAck {
    pub status: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub skipped: usize,
}

/// Pushes telemetry to a running relay, the way a game-side exporter would.
#[derive(Clone)]
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(2))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn send_batch(&self, players: &[WireSample]) -> Result<IngestAck> {
        let response = self
            .client
            .post(format!("{}/telemetry", self.base_url))
            .json(&BatchRequest { players })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Relay rejected batch: {} {}", status, body));
        }

        Ok(response.json().await?)
    }

    pub async fn start_recording(&self) -> Result<()> {
        self.post_empty("recording/start").await
    }

    pub async fn stop_recording(&self) -> Result<()> {
        self.post_empty("recording/stop").await
    }

    async fn post_empty(&self, path: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(anyhow!("Relay error on /{}: {}", path, response.status()));
        }
        Ok(())
    }
}
