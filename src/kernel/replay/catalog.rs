use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{error, info, warn};

use super::archive::ReplayArchive;
use super::types::{ReplayId, ReplayRecord, ReplaySummary};
use crate::kernel::error::{RelayError, RelayResult};

/// Sealed replays, keyed by id. Guarded by its own lock and never calls into
/// the live table or the recorder.
pub struct ReplayCatalog {
    records: RwLock<HashMap<ReplayId, Arc<ReplayRecord>>>,
    archive: Option<Box<dyn ReplayArchive>>,
}

impl ReplayCatalog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            archive: None,
        }
    }

    /// Catalog that also writes every stored record to `archive`.
    pub fn with_archive(archive: Box<dyn ReplayArchive>) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            archive: Some(archive),
        }
    }

    /// Pulls previously archived replays into memory. Returns how many loaded.
    pub fn restore(&self) -> RelayResult<usize> {
        let Some(archive) = &self.archive else {
            return Ok(0);
        };
        let loaded = archive.load_all()?;
        let count = loaded.len();
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        for record in loaded {
            records.insert(record.id.clone(), Arc::new(record));
        }
        info!(count, "Restored archived replays");
        Ok(count)
    }

    /// Adds a sealed record. Always succeeds; an id collision overwrites.
    /// An archive failure is logged and the in-memory copy is kept.
    pub fn store(&self, record: ReplayRecord) -> Arc<ReplayRecord> {
        let record = Arc::new(record);
        let previous = self
            .records
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(record.id.clone(), record.clone());
        if previous.is_some() {
            warn!(id = %record.id, "Replay id collision, newer record wins");
        }

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.save(&record) {
                error!(id = %record.id, error = %e, "Failed to archive replay");
            }
        }
        record
    }

    /// Metadata for every replay, oldest first.
    pub fn list(&self) -> Vec<ReplaySummary> {
        let mut summaries: Vec<ReplaySummary> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|r| r.summary())
            .collect();
        summaries.sort_by(|a, b| a.started_at.cmp(&b.started_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    pub fn get(&self, id: &str) -> RelayResult<Arc<ReplayRecord>> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| RelayError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Default for ReplayCatalog {
    fn default() -> Self {
        Self::new()
    }
}
