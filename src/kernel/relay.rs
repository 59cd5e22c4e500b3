use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::error::RelayResult;
use super::ingest::{IngestReport, IngestRouter};
use super::replay::{
    FileReplayArchive, RecordingStatus, ReplayCatalog, ReplayRecord, ReplayRecorder, ReplaySummary,
    DEFAULT_MAX_FRAMES,
};
use super::state::{LiveStateTable, DEFAULT_STALE_AFTER};
use super::telemetry::{IngestMetrics, IngestStats, TelemetrySample};
use super::time::{Clock, Timestamp};
use crate::config::RelayConfig;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: &'static str,
    pub live_players: usize,
    pub recording: bool,
    pub replays: usize,
    #[serde(flatten)]
    pub ingest: IngestStats,
}

/// The relay as seen from the outside: live table, recorder and catalog
/// behind one request/response surface.
///
/// Holds no state of its own. Each call touches one component at a time and
/// never holds one component's lock while calling into another.
pub struct Relay {
    table: Arc<LiveStateTable>,
    recorder: Arc<ReplayRecorder>,
    catalog: ReplayCatalog,
    router: IngestRouter,
    metrics: Arc<IngestMetrics>,
    stale_after: Duration,
}

impl Relay {
    /// In-memory relay with default staleness and frame cap.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_parts(clock, DEFAULT_STALE_AFTER, DEFAULT_MAX_FRAMES, ReplayCatalog::new())
    }

    pub fn with_parts(
        clock: Arc<dyn Clock>,
        stale_after: Duration,
        max_frames: usize,
        catalog: ReplayCatalog,
    ) -> Self {
        let table = Arc::new(LiveStateTable::new(clock.clone()));
        let recorder = Arc::new(ReplayRecorder::with_max_frames(clock.clone(), max_frames));
        let metrics = Arc::new(IngestMetrics::new());
        let router = IngestRouter::new(table.clone(), recorder.clone(), metrics.clone(), clock);
        Self {
            table,
            recorder,
            catalog,
            router,
            metrics,
            stale_after,
        }
    }

    /// Builds the relay described by `config`, restoring archived replays
    /// when a replay directory is configured.
    pub fn from_config(config: &RelayConfig, clock: Arc<dyn Clock>) -> RelayResult<Self> {
        let catalog = match &config.replay_dir {
            Some(dir) => {
                let catalog = ReplayCatalog::with_archive(Box::new(FileReplayArchive::new(dir)));
                catalog.restore()?;
                catalog
            }
            None => ReplayCatalog::new(),
        };
        Ok(Self::with_parts(clock, config.stale_after, config.max_frames, catalog))
    }

    pub fn ingest(&self, raw: &[u8]) -> RelayResult<IngestReport> {
        self.router.ingest(raw)
    }

    /// Live entities within the staleness window. Evicts the rest.
    pub fn poll(&self) -> Vec<TelemetrySample> {
        self.table.snapshot(self.stale_after)
    }

    pub fn start_recording(&self) -> RelayResult<Timestamp> {
        self.recorder.start()
    }

    /// Seals the active recording and hands it to the catalog.
    pub fn stop_recording(&self) -> RelayResult<ReplaySummary> {
        let record = self.recorder.stop()?;
        let stored = self.catalog.store(record);
        info!(id = %stored.id, frames = stored.frame_count(), "Replay cataloged");
        Ok(stored.summary())
    }

    pub fn recording_status(&self) -> RecordingStatus {
        self.recorder.status()
    }

    pub fn list_replays(&self) -> Vec<ReplaySummary> {
        self.catalog.list()
    }

    pub fn get_replay(&self, id: &str) -> RelayResult<Arc<ReplayRecord>> {
        self.catalog.get(id)
    }

    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: "ok",
            live_players: self.table.size(),
            recording: self.recorder.is_recording(),
            replays: self.catalog.len(),
            ingest: self.metrics.snapshot(),
        }
    }
}
