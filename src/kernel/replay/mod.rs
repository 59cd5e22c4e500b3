//! Recording and replay.
//!
//! The recorder owns the single active buffer; sealing hands the finished
//! record to the catalog, which is the only place replays live afterwards.

pub mod archive;
pub mod catalog;
pub mod recorder;
pub mod types;

pub use archive::{FileReplayArchive, ReplayArchive};
pub use catalog::ReplayCatalog;
pub use recorder::{RecorderState, RecordingStatus, ReplayRecorder, DEFAULT_MAX_FRAMES};
pub use types::{Frame, ReplayId, ReplayRecord, ReplaySummary};
