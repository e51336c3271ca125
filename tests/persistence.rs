use std::time::{Duration, Instant};

use touchline::config::EngineConfig;
use touchline::persist::{JsonFileStore, MemoryStore, SnapshotStore, SnapshotWriter};
use touchline::record::RecordSink;
use touchline::record_store::SqliteRecordStore;
use touchline::roster::CardKind;
use touchline::session::{EngineError, MatchSession};
use touchline::state::MatchState;
use touchline::stats::StatKey;

fn played_state() -> MatchState {
    let mut session = MatchSession::new(&EngineConfig::default());
    session.start_clock().unwrap();
    for _ in 0..75 {
        session.tick();
    }
    session.apply_stat_delta("slot-7", StatKey::Tries, 1).unwrap();
    session.assign_card("slot-3", CardKind::Yellow, "Dissent").unwrap();
    session.record_set(true).unwrap();
    session.state().clone()
}

#[test]
fn file_store_round_trips_state() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path(), "coach@example.com");
    assert!(!store.exists());
    assert!(store.load().unwrap().is_none());

    let state = played_state();
    store.save(&state).unwrap();
    assert!(store.exists());
    assert!(store.path().starts_with(dir.path()));
    assert_eq!(store.load().unwrap(), Some(state));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    store.clear().unwrap();
}

#[test]
fn file_store_is_scoped_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let mut coach = JsonFileStore::new(dir.path(), "coach");
    let other = JsonFileStore::new(dir.path(), "assistant");
    coach.save(&played_state()).unwrap();
    assert!(other.load().unwrap().is_none());
}

#[test]
fn corrupt_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFileStore::new(dir.path(), "coach");
    std::fs::write(store.path(), "not json").unwrap();
    assert!(store.load().is_err());
}

#[test]
fn snapshot_json_uses_camel_case_keys() {
    let raw = serde_json::to_value(played_state()).unwrap();
    assert!(raw.get("elapsedSeconds").is_some());
    assert!(raw.get("isRunning").is_some());
    assert!(raw.get("opponentScore").is_some());
    let player = &raw["players"][2];
    assert_eq!(player["cardStatus"], "yellow");
    assert_eq!(player["sinBinStartTime"], 75);
    assert_eq!(raw["gameLog"][0]["kind"], "yellow_card");
}

#[test]
fn writer_waits_for_quiet_period() {
    let mut session = MatchSession::new(&EngineConfig::default());
    let mut writer = SnapshotWriter::new(
        Box::new(MemoryStore::default()),
        Duration::from_millis(500),
        Duration::from_secs(5),
    );
    let t0 = Instant::now();
    assert!(!writer.poll(&mut session, t0));

    session.record_set(true).unwrap();
    assert!(!writer.poll(&mut session, t0));
    assert!(writer.has_pending());
    assert!(!writer.poll(&mut session, t0 + Duration::from_millis(200)));
    assert!(writer.poll(&mut session, t0 + Duration::from_millis(600)));
    assert_eq!(writer.writes(), 1);
    assert!(!session.is_dirty());
    assert!(writer.store().exists());

    assert!(!writer.poll(&mut session, t0 + Duration::from_secs(2)));
    assert_eq!(writer.writes(), 1);
}

#[test]
fn writer_flushes_running_clock_after_max_delay() {
    let mut session = MatchSession::new(&EngineConfig::default());
    session.start_clock().unwrap();
    let mut writer = SnapshotWriter::new(
        Box::new(MemoryStore::default()),
        Duration::from_millis(1500),
        Duration::from_secs(5),
    );
    let t0 = Instant::now();
    let mut written = 0;
    for second in 0..12u64 {
        session.tick();
        if writer.poll(&mut session, t0 + Duration::from_secs(second)) {
            written += 1;
        }
    }
    assert_eq!(written, 2);
    assert_eq!(writer.writes(), 2);
}

#[test]
fn writer_flush_and_clear_stored() {
    let mut session = MatchSession::new(&EngineConfig::default());
    let mut writer = SnapshotWriter::new(
        Box::new(MemoryStore::default()),
        Duration::from_millis(1500),
        Duration::from_secs(5),
    );
    assert!(!writer.flush(&mut session));
    session.toggle_field("slot-15").unwrap();
    assert!(writer.flush(&mut session));

    let restored = writer.store().load().unwrap().unwrap();
    assert_eq!(restored.on_field_count(), 14);

    writer.clear_stored().unwrap();
    assert!(writer.store().load().unwrap().is_none());
}

#[test]
fn discarded_match_stays_discarded() {
    let mut session = MatchSession::new(&EngineConfig::default());
    let mut writer = SnapshotWriter::new(
        Box::new(MemoryStore::default()),
        Duration::from_millis(500),
        Duration::from_secs(5),
    );
    let t0 = Instant::now();
    session.start_clock().unwrap();
    session.tick();
    assert!(writer.flush(&mut session));
    session.tick();
    assert!(!writer.poll(&mut session, t0));
    assert!(session.is_dirty());

    writer.discard(&mut session).unwrap();
    assert!(!session.is_dirty());
    assert!(session.is_discarded());
    assert!(!session.state().clock.is_running);

    for secs in [1, 2, 10] {
        assert!(!writer.poll(&mut session, t0 + Duration::from_secs(secs)));
    }
    assert!(!writer.flush(&mut session));
    assert!(writer.store().load().unwrap().is_none());

    assert!(!session.tick());
    assert_eq!(session.start_clock(), Err(EngineError::MatchDiscarded));
    assert_eq!(
        session.apply_stat_delta("slot-1", StatKey::Tackles, 1),
        Err(EngineError::MatchDiscarded)
    );
    session.stop_clock();
    session.cancel_end_period();
    assert!(!session.is_dirty());
    assert!(writer.store().load().unwrap().is_none());
}

#[test]
fn sqlite_store_keeps_finished_matches() {
    let mut store = SqliteRecordStore::in_memory("coach").unwrap();
    assert!(store.list_records().unwrap().is_empty());

    let mut session = MatchSession::new(&EngineConfig::default());
    session.start_clock().unwrap();
    session.apply_stat_delta("slot-1", StatKey::Tries, 1).unwrap();
    let record = session.build_record(None, "2026-03-14T15:00:00".to_string());

    let id = store.submit(&record).unwrap();
    let rows = store.list_records().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id.to_string(), id);
    assert_eq!(rows[0].final_score, "4 - 0");
    assert_eq!(rows[0].result, "win");

    let loaded = store.load_record(rows[0].id).unwrap().unwrap();
    assert_eq!(loaded, record);
    assert!(store.load_record(999).unwrap().is_none());
}
