use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

use super::telemetry::{EntityId, TelemetrySample};
use super::time::{Clock, Timestamp};

pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(5000);

/// Latest sample per entity. One coarse lock covers `put` and `snapshot`.
///
/// Staleness is enforced at read time: every `snapshot` drops entries older
/// than the window, so a departed entity vanishes within one window of the
/// next poll without a background reaper.
pub struct LiveStateTable {
    entries: Mutex<HashMap<EntityId, TelemetrySample>>,
    clock: Arc<dyn Clock>,
}

impl LiveStateTable {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<EntityId, TelemetrySample>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Inserts or fully replaces the entry for `sample.id`, stamped with now.
    pub fn put(&self, sample: TelemetrySample) -> Timestamp {
        let now = self.clock.now();
        self.put_all(std::iter::once(sample), now);
        now
    }

    /// Applies several samples under one lock, all stamped `received_at = at`.
    /// Last write wins per id, including duplicates within the same call.
    pub fn put_all<I>(&self, samples: I, at: Timestamp)
    where
        I: IntoIterator<Item = TelemetrySample>,
    {
        let mut entries = self.lock();
        for mut sample in samples {
            sample.received_at = at;
            entries.insert(sample.id.clone(), sample);
        }
    }

    /// Every sample no older than `stale_after`. Older entries are removed
    /// permanently as a side effect.
    pub fn snapshot(&self, stale_after: Duration) -> Vec<TelemetrySample> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let mut evicted = Vec::new();
        entries.retain(|id, sample| {
            let fresh = sample.received_at.age_at(now) <= stale_after;
            if !fresh {
                evicted.push(id.clone());
            }
            fresh
        });

        let mut live: Vec<TelemetrySample> = entries.values().cloned().collect();
        drop(entries);

        if !evicted.is_empty() {
            debug!(?evicted, "Evicted stale entities");
        }
        live.sort_by(|a, b| a.id.cmp(&b.id));
        live
    }

    /// Entry count, stale or not. Diagnostic only.
    pub fn size(&self) -> usize {
        self.lock().len()
    }
}
