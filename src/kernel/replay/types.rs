use serde::{Deserialize, Serialize};

use crate::kernel::telemetry::TelemetrySample;
use crate::kernel::time::Timestamp;

pub type ReplayId = String;

/// Everything one ingest call delivered while a recording was active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub captured_at: Timestamp,
    pub samples: Vec<TelemetrySample>,
}

/// A sealed recording. Immutable once it leaves the recorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayRecord {
    pub id: ReplayId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub frames: Vec<Frame>,
    /// Frames refused after the per-recording cap was reached.
    #[serde(default)]
    pub dropped_frames: u64,
}

impl ReplayRecord {
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn summary(&self) -> ReplaySummary {
        ReplaySummary {
            id: self.id.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            frame_count: self.frames.len(),
        }
    }
}

/// Listing entry. Carries no frames so listing stays cheap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub id: ReplayId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub frame_count: usize,
}
