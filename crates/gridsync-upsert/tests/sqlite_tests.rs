// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upsert engine against the SQLite store.

use std::sync::Arc;

use gridsync_core::{FieldValue, Record, RecordStore};
use gridsync_storage::{Database, SqliteRecordStore};
use gridsync_upsert::{Collection, UpsertEngine};

fn carbon() -> Collection {
    Collection::new("carbon_intensity", ["datetime", "zone"])
        .with_timestamp_fields(["datetime", "updatedAt", "createdAt"])
}

fn entry(datetime: &str, intensity: i64) -> Record {
    Record::new()
        .with("datetime", datetime)
        .with("zone", "TR")
        .with("carbonIntensity", intensity)
        .with("updatedAt", "2025-01-01T05:12:44.123456Z")
        .with("isEstimated", false)
        .with("estimationMethod", FieldValue::Null)
}

#[tokio::test]
async fn sqlite_round_trip_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gridsync.db");
    let store = Arc::new(SqliteRecordStore::new(
        Database::open(path.to_str().unwrap(), true).await.unwrap(),
    ));
    let engine = UpsertEngine::new(store.clone());
    let batch = vec![
        entry("2025-01-01T00:00:00Z", 410),
        entry("2025-01-01T01:00:00.000Z", 395),
    ];

    let first = engine.apply(batch.clone(), &carbon()).await.unwrap();
    assert_eq!(first.inserted, 2);

    let second = engine.apply(batch, &carbon()).await.unwrap();
    assert_eq!((second.inserted, second.updated, second.skipped), (0, 0, 2));

    let third = engine
        .apply(vec![entry("2025-01-01T03:00:00+03:00", 420)], &carbon())
        .await
        .unwrap();
    assert_eq!((third.inserted, third.updated, third.skipped), (0, 1, 0));

    assert_eq!(store.count("carbon_intensity").await.unwrap(), 2);
    let stored = store
        .find_one("carbon_intensity", r#"[["datetime","2025-01-01T00:00:00.000Z"],["zone","TR"]]"#)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.record.get("carbonIntensity"), Some(&FieldValue::Integer(420)));
    assert_eq!(
        stored.record.get("updatedAt"),
        Some(&FieldValue::Text("2025-01-01T05:12:44.123Z".into()))
    );
    assert!(stored.record.get("estimationMethod").is_none());
}

#[tokio::test]
async fn changes_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gridsync.db");
    let path = path.to_str().unwrap();

    {
        let store = SqliteRecordStore::new(Database::open(path, true).await.unwrap());
        let engine = UpsertEngine::new(Arc::new(store.clone()));
        engine
            .apply(vec![entry("2025-01-01T00:00:00Z", 410)], &carbon())
            .await
            .unwrap();
        store.close().await.unwrap();
    }

    let store = SqliteRecordStore::new(Database::open(path, true).await.unwrap());
    let engine = UpsertEngine::new(Arc::new(store));
    let report = engine
        .apply(vec![entry("2025-01-01T00:00:00Z", 410)], &carbon())
        .await
        .unwrap();
    assert_eq!(report.skipped, 1);
}
