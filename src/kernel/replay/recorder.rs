use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};
use uuid::Uuid;

use super::types::{Frame, ReplayId, ReplayRecord};
use crate::kernel::error::{RelayError, RelayResult};
use crate::kernel::time::{Clock, Timestamp};

/// `0` means no cap: a recording keeps every frame until stop.
pub const DEFAULT_MAX_FRAMES: usize = 0;

/// The buffer owned by an in-progress recording.
#[derive(Debug)]
pub struct ActiveRecording {
    started_at: Timestamp,
    frames: Vec<Frame>,
    dropped_frames: u64,
}

impl ActiveRecording {
    fn new(started_at: Timestamp) -> Self {
        Self {
            started_at,
            frames: Vec::new(),
            dropped_frames: 0,
        }
    }
}

/// Process-wide recorder state. Exactly one value at a time.
#[derive(Debug, Default)]
pub enum RecorderState {
    #[default]
    Idle,
    Recording(ActiveRecording),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStatus {
    pub recording: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    pub frame_count: usize,
}

/// Idle -> Recording -> Idle, looping for the life of the process.
/// `start`, `stop` and `record_frame` all serialize on one lock.
pub struct ReplayRecorder {
    state: Mutex<RecorderState>,
    clock: Arc<dyn Clock>,
    max_frames: usize,
}

impl ReplayRecorder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_max_frames(clock, DEFAULT_MAX_FRAMES)
    }

    pub fn with_max_frames(clock: Arc<dyn Clock>, max_frames: usize) -> Self {
        Self {
            state: Mutex::new(RecorderState::Idle),
            clock,
            max_frames,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecorderState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn start(&self) -> RelayResult<Timestamp> {
        let mut state = self.lock();
        if let RecorderState::Recording(_) = *state {
            return Err(RelayError::AlreadyRecording);
        }
        let started_at = self.clock.now();
        *state = RecorderState::Recording(ActiveRecording::new(started_at));
        info!(started_at = started_at.as_millis(), "Recording started");
        Ok(started_at)
    }

    /// Seals the active buffer into a record and returns to `Idle`.
    /// Zero-frame recordings are sealed like any other.
    pub fn stop(&self) -> RelayResult<ReplayRecord> {
        let active = {
            let mut state = self.lock();
            match std::mem::take(&mut *state) {
                RecorderState::Recording(active) => active,
                RecorderState::Idle => return Err(RelayError::NotRecording),
            }
        };

        let ended_at = self.clock.now().max(active.started_at);
        let record = ReplayRecord {
            id: replay_id(ended_at),
            started_at: active.started_at,
            ended_at,
            frames: active.frames,
            dropped_frames: active.dropped_frames,
        };
        info!(
            id = %record.id,
            frames = record.frames.len(),
            dropped = record.dropped_frames,
            "Recording stopped"
        );
        Ok(record)
    }

    /// Appends `frame` if recording; otherwise a no-op. Returns whether the
    /// frame was kept. Never fails.
    ///
    /// A frame stamped earlier than the last kept frame (a concurrent ingest
    /// that lost the race for this lock) is re-stamped to the last frame's
    /// time so the sequence stays non-decreasing.
    pub fn record_frame(&self, mut frame: Frame) -> bool {
        let mut state = self.lock();
        let RecorderState::Recording(active) = &mut *state else {
            return false;
        };

        if self.max_frames > 0 && active.frames.len() >= self.max_frames {
            if active.dropped_frames == 0 {
                warn!(max_frames = self.max_frames, "Recording frame cap reached, dropping further frames");
            }
            active.dropped_frames += 1;
            return false;
        }

        let floor = active
            .frames
            .last()
            .map(|f| f.captured_at)
            .unwrap_or(active.started_at);
        frame.captured_at = frame.captured_at.max(floor);
        active.frames.push(frame);
        true
    }

    pub fn is_recording(&self) -> bool {
        matches!(*self.lock(), RecorderState::Recording(_))
    }

    pub fn status(&self) -> RecordingStatus {
        match &*self.lock() {
            RecorderState::Idle => RecordingStatus {
                recording: false,
                started_at: None,
                frame_count: 0,
            },
            RecorderState::Recording(active) => RecordingStatus {
                recording: true,
                started_at: Some(active.started_at),
                frame_count: active.frames.len(),
            },
        }
    }
}

fn replay_id(ended_at: Timestamp) -> ReplayId {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("replay-{}-{}", ended_at.as_millis(), &suffix[..8])
}
