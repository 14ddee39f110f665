//! Crash/restart tests for intent-store WAL replay semantics: a
//! process that opens the store against the same path after an
//! unclean shutdown must see exactly the events it durably wrote, and
//! nothing double-applied.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use kestrel_core::model::IntentState;
use kestrel_infra::store::{IntentStore, StoreMetrics};

fn temp_wal_path(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "kestrel_wal_{tag}_{}_{}.jsonl",
        std::process::id(),
        nanos
    ))
}

#[test]
fn crash_after_create_replays_as_received() {
    let path = temp_wal_path("create");
    let mut metrics = StoreMetrics::new();
    {
        let mut store = IntentStore::with_storage_path(path.clone()).unwrap();
        store
            .create("intent-1", serde_json::json!({"to": "0xabc"}), "hash-1", "corr-1", "ts-1", &mut metrics)
            .unwrap();
    }

    let reopened = IntentStore::with_storage_path(path.clone()).unwrap();
    assert_eq!(reopened.get("intent-1").unwrap().state, IntentState::Received);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn crash_after_advance_does_not_replay_twice() {
    let path = temp_wal_path("advance");
    let mut metrics = StoreMetrics::new();
    {
        let mut store = IntentStore::with_storage_path(path.clone()).unwrap();
        store
            .create("intent-2", serde_json::json!({}), "hash-2", "corr-2", "ts-1", &mut metrics)
            .unwrap();
        store
            .advance("intent-2", IntentState::Screened, "corr-2", None, None, "ts-2", &mut metrics)
            .unwrap();
    }

    let reopened = IntentStore::with_storage_path(path.clone()).unwrap();
    let intent = reopened.get("intent-2").unwrap();
    assert_eq!(intent.state, IntentState::Screened);
    assert_eq!(intent.version, 1);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn replay_outcome_reports_in_flight_intents() {
    let path = temp_wal_path("in-flight");
    let mut metrics = StoreMetrics::new();
    let mut store = IntentStore::with_storage_path(path.clone()).unwrap();
    store
        .create("intent-3", serde_json::json!({}), "hash-3", "corr-3", "ts-1", &mut metrics)
        .unwrap();
    store
        .create("intent-4", serde_json::json!({}), "hash-4", "corr-4", "ts-1", &mut metrics)
        .unwrap();
    store
        .advance("intent-4", IntentState::Screened, "corr-4", None, None, "ts-2", &mut metrics)
        .unwrap();
    store
        .advance("intent-4", IntentState::Rejected, "corr-4", None, None, "ts-3", &mut metrics)
        .unwrap();

    let outcome = store.replay();
    assert_eq!(outcome.intents_replayed, 2);
    assert_eq!(outcome.in_flight_count, 1);
    assert!(outcome.in_flight_ids.contains(&"intent-3".to_string()));
    let _ = std::fs::remove_file(&path);
}
