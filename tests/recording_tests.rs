use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use telemetry_relay::config::RelayConfig;
use telemetry_relay::kernel::error::{RelayError, RelayResult};
use telemetry_relay::kernel::relay::Relay;
use telemetry_relay::kernel::replay::{ReplayArchive, ReplayCatalog, ReplayRecord};
use telemetry_relay::kernel::time::ManualClock;

const TWO_PLAYERS: &[u8] = br#"{"players":[{"id":"A","x":1,"y":2,"z":3},{"id":"B","x":-1,"y":0,"z":7,"velocity":{"x":1}}]}"#;

/// Archive whose every write fails, as on a full disk.
struct FailingArchive;

impl ReplayArchive for FailingArchive {
    fn save(&self, _record: &ReplayRecord) -> RelayResult<()> {
        Err(RelayError::Archive("disk full".into()))
    }

    fn load_all(&self) -> RelayResult<Vec<ReplayRecord>> {
        Ok(Vec::new())
    }
}

fn relay_at(ms: u64) -> (Arc<ManualClock>, Relay) {
    let clock = Arc::new(ManualClock::new(ms));
    let relay = Relay::new(clock.clone());
    (clock, relay)
}

#[test]
fn test_double_start_is_rejected() {
    let (_clock, relay) = relay_at(0);
    relay.start_recording().unwrap();
    assert!(matches!(relay.start_recording(), Err(RelayError::AlreadyRecording)));
    assert!(relay.recording_status().recording, "State unchanged by the rejected call");
}

#[test]
fn test_concurrent_starts_admit_exactly_one() {
    const THREADS: usize = 8;
    let (_clock, relay) = relay_at(0);
    let relay = Arc::new(relay);
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let relay = relay.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                relay.start_recording()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let started = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(RelayError::AlreadyRecording)))
        .count();
    assert_eq!(started, 1);
    assert_eq!(rejected, THREADS - 1);
    assert!(relay.recording_status().recording);
}

#[test]
fn test_stop_while_idle_is_rejected() {
    let (_clock, relay) = relay_at(0);
    assert!(matches!(relay.stop_recording(), Err(RelayError::NotRecording)));
    assert!(relay.list_replays().is_empty());
}

#[test]
fn test_two_batches_make_two_frames() {
    let (clock, relay) = relay_at(10_000);

    // 1. Record two ticks of two players
    relay.start_recording().unwrap();
    clock.advance(100);
    relay.ingest(TWO_PLAYERS).unwrap();
    clock.advance(100);
    relay.ingest(TWO_PLAYERS).unwrap();
    clock.advance(100);
    let stopped = relay.stop_recording().unwrap();

    // 2. Listing carries metadata only
    let listed = relay.list_replays();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, stopped.id);
    assert_eq!(listed[0].frame_count, 2);
    assert_eq!(listed[0].started_at.as_millis(), 10_000);
    assert_eq!(listed[0].ended_at.as_millis(), 10_300);

    // 3. Full retrieval
    let record = relay.get_replay(&stopped.id).unwrap();
    assert_eq!(record.frames.len(), 2);
    for frame in &record.frames {
        assert_eq!(frame.samples.len(), 2);
    }
    assert_eq!(record.frames[0].captured_at.as_millis(), 10_100);
    assert_eq!(record.frames[1].captured_at.as_millis(), 10_200);
}

#[test]
fn test_n_batches_give_n_ordered_frames() {
    let (clock, relay) = relay_at(0);
    relay.start_recording().unwrap();
    for i in 0..25 {
        let body = format!(r#"{{"players":[{{"id":"A","x":{},"y":0,"z":0}}]}}"#, i);
        relay.ingest(body.as_bytes()).unwrap();
        clock.advance(i % 3);
    }
    let id = relay.stop_recording().unwrap().id;

    let record = relay.get_replay(&id).unwrap();
    assert_eq!(record.frame_count(), 25);
    assert!(record.frames.windows(2).all(|w| w[0].captured_at <= w[1].captured_at));
    let xs: Vec<f64> = record.frames.iter().map(|f| f.samples[0].position.x).collect();
    assert_eq!(xs, (0..25).map(|i| i as f64).collect::<Vec<_>>(), "Call order preserved");
}

#[test]
fn test_ingest_outside_recording_is_not_captured() {
    let (_clock, relay) = relay_at(0);
    relay.ingest(TWO_PLAYERS).unwrap();
    relay.start_recording().unwrap();
    relay.ingest(TWO_PLAYERS).unwrap();
    let id = relay.stop_recording().unwrap().id;
    relay.ingest(TWO_PLAYERS).unwrap();

    assert_eq!(relay.get_replay(&id).unwrap().frame_count(), 1);
}

#[test]
fn test_rejected_payload_adds_no_frame() {
    let (_clock, relay) = relay_at(0);
    relay.start_recording().unwrap();
    assert!(relay.ingest(br#"{"players":[]}"#).is_err());
    assert!(relay.ingest(br#"{"players":[{"id":"A"}]}"#).is_err());
    assert_eq!(relay.stop_recording().unwrap().frame_count, 0);
}

#[test]
fn test_empty_recording_is_cataloged() {
    let (_clock, relay) = relay_at(0);
    relay.start_recording().unwrap();
    let summary = relay.stop_recording().unwrap();
    assert_eq!(summary.frame_count, 0);
    assert!(relay.get_replay(&summary.id).unwrap().frames.is_empty());
}

#[test]
fn test_unknown_replay_is_not_found() {
    let (_clock, relay) = relay_at(0);
    assert!(matches!(relay.get_replay("replay-0-deadbeef"), Err(RelayError::NotFound(_))));
}

#[test]
fn test_sessions_get_distinct_ids() {
    let (clock, relay) = relay_at(0);
    let mut ids = Vec::new();
    for _ in 0..3 {
        relay.start_recording().unwrap();
        relay.ingest(TWO_PLAYERS).unwrap();
        clock.advance(1);
        ids.push(relay.stop_recording().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 3);
    assert_eq!(relay.list_replays().len(), 3);
}

#[test]
fn test_replays_survive_restart_with_replay_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = RelayConfig {
        replay_dir: Some(dir.path().to_path_buf()),
        ..RelayConfig::default()
    };

    // 1. First process records one session
    let clock = Arc::new(ManualClock::new(500));
    let first = Relay::from_config(&config, clock.clone()).unwrap();
    first.start_recording().unwrap();
    first.ingest(br#"{"players":[{"id":"A","x":0.1,"y":0.2,"z":0.30000000000000004}]}"#).unwrap();
    clock.advance(250);
    first.ingest(TWO_PLAYERS).unwrap();
    let id = first.stop_recording().unwrap().id;
    assert!(dir.path().join(format!("{}.json", id)).exists());

    // 2. Second process sees it unchanged
    let second = Relay::from_config(&config, Arc::new(ManualClock::new(0))).unwrap();
    assert_eq!(second.list_replays(), first.list_replays());
    assert_eq!(*second.get_replay(&id).unwrap(), *first.get_replay(&id).unwrap());
    let z = second.get_replay(&id).unwrap().frames[0].samples[0].position.z;
    assert_eq!(z.to_bits(), 0.30000000000000004_f64.to_bits());
}

#[test]
fn test_frame_cap_from_parts() {
    let clock = Arc::new(ManualClock::new(0));
    let relay = Relay::with_parts(clock, Duration::from_secs(5), 3, ReplayCatalog::new());
    relay.start_recording().unwrap();
    for _ in 0..5 {
        relay.ingest(TWO_PLAYERS).unwrap();
    }
    let id = relay.stop_recording().unwrap().id;
    let record = relay.get_replay(&id).unwrap();
    assert_eq!(record.frame_count(), 3);
    assert_eq!(record.dropped_frames, 2);
}

#[test]
fn test_archive_failure_still_catalogs_replay() {
    let clock = Arc::new(ManualClock::new(0));
    let catalog = ReplayCatalog::with_archive(Box::new(FailingArchive));
    let relay = Relay::with_parts(clock.clone(), Duration::from_secs(5), 0, catalog);

    relay.start_recording().unwrap();
    clock.advance(100);
    relay.ingest(TWO_PLAYERS).unwrap();
    let summary = relay.stop_recording().expect("Stop succeeds even when the archive write fails");

    assert_eq!(summary.frame_count, 1);
    assert_eq!(relay.get_replay(&summary.id).unwrap().frame_count(), 1);
    assert_eq!(relay.list_replays().len(), 1);
    assert!(!relay.recording_status().recording);
}
