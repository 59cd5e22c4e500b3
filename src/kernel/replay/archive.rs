use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use super::types::ReplayRecord;
use crate::kernel::error::{RelayError, RelayResult};

/// Durable home for sealed replays. Written once per record, at seal time.
pub trait ReplayArchive: Send + Sync {
    fn save(&self, record: &ReplayRecord) -> RelayResult<()>;
    fn load_all(&self) -> RelayResult<Vec<ReplayRecord>>;
}

/// One `<id>.json` file per replay inside a directory.
#[derive(Debug, Clone)]
pub struct FileReplayArchive {
    dir: PathBuf,
}

impl FileReplayArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, id: &str) -> RelayResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            return Err(RelayError::Archive(format!("unsafe replay id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl ReplayArchive for FileReplayArchive {
    fn save(&self, record: &ReplayRecord) -> RelayResult<()> {
        let path = self.path_for(&record.id)?;
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_vec(record).map_err(|e| RelayError::Archive(e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "Replay archived");
        Ok(())
    }

    fn load_all(&self) -> RelayResult<Vec<ReplayRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read(&path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| serde_json::from_slice::<ReplayRecord>(&bytes).map_err(|e| e.to_string()));
            match parsed {
                Ok(record) => records.push(record),
                Err(reason) => warn!(path = %path.display(), %reason, "Skipping unreadable replay file"),
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::replay::types::Frame;
    use crate::kernel::telemetry::{Orientation, TelemetrySample, Vec3};
    use crate::kernel::time::Timestamp;

    fn record(id: &str) -> ReplayRecord {
        let mut sample = TelemetrySample::new("A", Vec3::new(0.1, -2.000000000000001, 1e300))
            .with_velocity(Vec3::new(f64::MIN_POSITIVE, 0.0, -0.0))
            .with_orientation(Orientation { yaw: 359.999, pitch: -1.5, roll: 0.3 });
        sample.received_at = Timestamp::from_millis(42);
        ReplayRecord {
            id: id.to_string(),
            started_at: Timestamp::from_millis(40),
            ended_at: Timestamp::from_millis(50),
            frames: vec![
                Frame { captured_at: Timestamp::from_millis(42), samples: vec![sample.clone()] },
                Frame { captured_at: Timestamp::from_millis(45), samples: vec![sample] },
            ],
            dropped_frames: 0,
        }
    }

    #[test]
    fn test_round_trip_preserves_frames_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileReplayArchive::new(dir.path());
        let original = record("replay-50-abcdef01");
        archive.save(&original).unwrap();

        let loaded = archive.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0], original);
        let (a, b) = (&loaded[0].frames[0].samples[0], &original.frames[0].samples[0]);
        assert_eq!(a.position.y.to_bits(), b.position.y.to_bits());
        assert_eq!(a.velocity.x.to_bits(), b.velocity.x.to_bits());
    }

    #[test]
    fn test_unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileReplayArchive::new(dir.path());
        archive.save(&record("replay-1-00000000")).unwrap();
        fs::write(dir.path().join("broken.json"), b"{ nope").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        assert_eq!(archive.load_all().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_dir_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileReplayArchive::new(dir.path().join("absent"));
        assert!(archive.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_rejects_path_like_ids() {
        let dir = tempfile::tempdir().unwrap();
        let archive = FileReplayArchive::new(dir.path());
        assert!(matches!(archive.save(&record("../escape")), Err(RelayError::Archive(_))));
    }
}
