use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use super::error::RelayResult;
use super::replay::{Frame, ReplayRecorder};
use super::state::LiveStateTable;
use super::telemetry::{parse_payload, EntityId, IngestMetrics, ParsedPayload, TelemetrySample};
use super::time::Clock;

/// Outcome of one accepted ingest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Valid records in the payload, before duplicate ids collapse.
    pub accepted: usize,
    pub skipped: usize,
    /// Whether the call became a frame of the active recording.
    pub recorded: bool,
}

/// Validates payloads and fans each accepted call out to the live table and,
/// while recording, to the recorder as one frame.
pub struct IngestRouter {
    table: Arc<LiveStateTable>,
    recorder: Arc<ReplayRecorder>,
    metrics: Arc<IngestMetrics>,
    clock: Arc<dyn Clock>,
}

impl IngestRouter {
    pub fn new(
        table: Arc<LiveStateTable>,
        recorder: Arc<ReplayRecorder>,
        metrics: Arc<IngestMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            table,
            recorder,
            metrics,
            clock,
        }
    }

    pub fn ingest(&self, raw: &[u8]) -> RelayResult<IngestReport> {
        match parse_payload(raw) {
            Ok(parsed) => Ok(self.apply(parsed)),
            Err(e) => {
                self.metrics.payload_rejected();
                warn!(error = %e, "Rejected telemetry payload");
                Err(e)
            }
        }
    }

    /// Every record in one call shares a single stamp, used both as
    /// `receivedAt` and as the frame's `capturedAt`.
    pub fn apply(&self, parsed: ParsedPayload) -> IngestReport {
        let ParsedPayload { samples, skipped } = parsed;
        for s in &skipped {
            warn!(index = s.index, reason = %s.reason, "Skipped malformed batch record");
        }

        let accepted = samples.len();
        let mut samples = last_per_id(samples);
        let now = self.clock.now();
        for sample in &mut samples {
            sample.received_at = now;
        }

        let frame_samples = self.recorder.is_recording().then(|| samples.clone());
        self.table.put_all(samples, now);

        let recorded = match frame_samples {
            Some(samples) => self.recorder.record_frame(Frame { captured_at: now, samples }),
            None => false,
        };

        self.metrics.payload_accepted(accepted, skipped.len());
        IngestReport {
            accepted,
            skipped: skipped.len(),
            recorded,
        }
    }
}

/// One sample per id, the last one seen, in first-seen order.
fn last_per_id(samples: Vec<TelemetrySample>) -> Vec<TelemetrySample> {
    let mut slots: HashMap<EntityId, usize> = HashMap::with_capacity(samples.len());
    let mut unique: Vec<TelemetrySample> = Vec::with_capacity(samples.len());
    for sample in samples {
        match slots.get(&sample.id) {
            Some(&slot) => unique[slot] = sample,
            None => {
                slots.insert(sample.id.clone(), unique.len());
                unique.push(sample);
            }
        }
    }
    unique
}
