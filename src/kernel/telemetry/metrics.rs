use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the ingest counters, for health reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    pub payloads_accepted: u64,
    pub payloads_rejected: u64,
    pub records_accepted: u64,
    pub records_skipped: u64,
}

/// Lock-free counters bumped by the ingest path. Diagnostic only; nothing
/// in the relay makes decisions based on them.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    payloads_accepted: AtomicU64,
    payloads_rejected: AtomicU64,
    records_accepted: AtomicU64,
    records_skipped: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload_accepted(&self, records: usize, skipped: usize) {
        self.payloads_accepted.fetch_add(1, Ordering::Relaxed);
        self.records_accepted.fetch_add(records as u64, Ordering::Relaxed);
        self.records_skipped.fetch_add(skipped as u64, Ordering::Relaxed);
    }

    pub fn payload_rejected(&self) {
        self.payloads_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestStats {
        IngestStats {
            payloads_accepted: self.payloads_accepted.load(Ordering::Relaxed),
            payloads_rejected: self.payloads_rejected.load(Ordering::Relaxed),
            records_accepted: self.records_accepted.load(Ordering::Relaxed),
            records_skipped: self.records_skipped.load(Ordering::Relaxed),
        }
    }
}
