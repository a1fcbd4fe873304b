//! Local store integration tests: annotations and the schedule surviving a
//! restart on the SQLite backend.

use std::sync::Arc;

use proptest::prelude::*;

use skintrack_core::config::CoreConfig;
use skintrack_core::kv::{KeyValueStore, SqliteStore, WriteQueue};
use skintrack_core::models::{next_appointment_id, Appointment, NewAppointment};
use skintrack_core::{AnnotationStore, ScheduleStore};

/// Fresh writer over the database file, as after an app restart.
fn reopen(path: &std::path::Path) -> WriteQueue {
    WriteQueue::spawn(Arc::new(SqliteStore::open(path).unwrap()), false)
}

#[tokio::test]
async fn test_annotation_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skintrack.db");
    let config = CoreConfig::default();

    {
        let mut annotations = AnnotationStore::open(reopen(&path), &config);
        assert_eq!(annotations.load("12", "Apply sunscreen").await, "Apply sunscreen");
        annotations.save("12", "Apply sunscreen daily");
        annotations.flush().await.unwrap();
    }

    let mut annotations = AnnotationStore::open(reopen(&path), &config);
    assert_eq!(
        annotations.load("12", "Apply sunscreen").await,
        "Apply sunscreen daily"
    );
    // Other patients are unaffected.
    assert_eq!(annotations.load("13", "none").await, "none");
}

#[tokio::test]
async fn test_schedule_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("skintrack.db");
    let config = CoreConfig::default();

    {
        let mut schedule = ScheduleStore::open(reopen(&path), &config, Vec::new());
        schedule.load().await;
        schedule
            .add(NewAppointment::new("Checkup", "2024-01-01"))
            .unwrap();
        schedule
            .add(NewAppointment::new("Follow-up", "2024-02-01"))
            .unwrap();
        schedule.remove("1").unwrap();
        schedule.flush().await.unwrap();
    }

    let mut schedule = ScheduleStore::open(reopen(&path), &config, Vec::new());
    let entries = schedule.load().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, "2");
    assert_eq!(entries[0].title, "Follow-up");

    assert_eq!(
        schedule
            .add(NewAppointment::new("Biopsy", "2024-03-01"))
            .unwrap()
            .id,
        "3"
    );
}

#[tokio::test]
async fn test_annotations_and_schedule_share_one_store() {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let writes = WriteQueue::spawn(Arc::clone(&store), false);

    let mut annotations = AnnotationStore::new(writes.clone(), "annotation:");
    let mut schedule = ScheduleStore::new(writes.clone(), "appointments", Vec::new());
    schedule.load().await;

    annotations.save("1", "note");
    schedule
        .add(NewAppointment::new("Checkup", "2024-01-01"))
        .unwrap();
    writes.flush().await.unwrap();

    assert_eq!(store.get("annotation:1").await.unwrap(), Some("note".into()));
    let stored: Vec<Appointment> =
        serde_json::from_str(&store.get("appointments").await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_coalesced_writes_keep_last_text() {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
    let config = CoreConfig {
        coalesce_writes: true,
        ..CoreConfig::default()
    };

    let writes = WriteQueue::spawn(Arc::clone(&store), config.coalesce_writes);
    let mut annotations = AnnotationStore::open(writes, &config);
    let mut text = String::new();
    for c in "Retinoid at night".chars() {
        text.push(c);
        annotations.save("8", &text);
    }
    annotations.flush().await.unwrap();

    assert_eq!(
        store.get("annotation:8").await.unwrap(),
        Some("Retinoid at night".into())
    );
}

fn appointments(ids: &[u64]) -> Vec<Appointment> {
    ids.iter()
        .map(|id| NewAppointment::new("Visit", "2024-01-01").with_id(id.to_string()))
        .collect()
}

proptest! {
    #[test]
    fn next_id_exceeds_every_numeric_id(ids in prop::collection::vec(0u64..10_000, 0..20)) {
        let entries = appointments(&ids);
        let next: u64 = next_appointment_id(&entries).parse().unwrap();

        let expected = ids.iter().max().map(|max| max + 1).unwrap_or(1);
        prop_assert_eq!(next, expected);
        prop_assert!(entries.iter().all(|a| a.id != next.to_string()));
    }
}
