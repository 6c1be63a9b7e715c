// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory record store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use gridsync_core::{
    FieldSummary, FieldValue, GridsyncError, HealthStatus, Record, RecordQuery, RecordStore,
    ReplaceOutcome, StoredRecord, canonical_timestamp,
};

type Collections = BTreeMap<String, BTreeMap<String, StoredRecord>>;

/// Text a field compares as in read queries; `None` when absent or null.
fn field_text(record: &Record, field: &str) -> Option<String> {
    match record.get(field)? {
        FieldValue::Null => None,
        FieldValue::Text(s) => Some(s.clone()),
        FieldValue::Timestamp(ts) => Some(canonical_timestamp(ts)),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Float(f) => Some(f.to_string()),
        FieldValue::Bool(b) => Some(b.to_string()),
    }
}

fn field_number(record: &Record, field: &str) -> Option<f64> {
    match record.get(field)? {
        FieldValue::Integer(i) => Some(*i as f64),
        FieldValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// Record store held in memory, keyed by collection then record key.
///
/// Counts every mutating call so tests can assert that a re-run issued no
/// writes. Flipping [`set_unavailable`](Self::set_unavailable) makes every
/// operation fail with [`GridsyncError::StoreUnavailable`]; `fail_after`
/// does the same once a number of operations have succeeded.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    collections: Arc<Mutex<Collections>>,
    next_row_id: Arc<AtomicI64>,
    inserts: Arc<AtomicUsize>,
    replaces: Arc<AtomicUsize>,
    operations: Arc<AtomicUsize>,
    fail_after: Arc<Mutex<Option<usize>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail every operation after `operations` more have succeeded.
    pub async fn fail_after(&self, operations: usize) {
        let done = self.operations.load(Ordering::SeqCst);
        *self.fail_after.lock().await = Some(done + operations);
    }

    /// Number of `insert` calls that created a record.
    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Number of `replace_if_changed` calls that changed a record.
    pub fn replace_count(&self) -> usize {
        self.replaces.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored record.
    pub async fn get(&self, collection: &str, key: &str) -> Option<StoredRecord> {
        self.collections
            .lock()
            .await
            .get(collection)
            .and_then(|records| records.get(key))
            .cloned()
    }

    /// Seed a record directly, bypassing write counters.
    pub async fn seed(&self, collection: &str, key: &str, record: Record) {
        let now = canonical_timestamp(&Utc::now());
        let row_id = self.next_row_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredRecord {
                    row_id,
                    key: key.to_string(),
                    record,
                    created_at: now.clone(),
                    updated_at: now,
                },
            );
    }

    async fn check_available(&self) -> Result<(), GridsyncError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GridsyncError::store("memory store marked unavailable"));
        }
        let done = self.operations.fetch_add(1, Ordering::SeqCst);
        if matches!(*self.fail_after.lock().await, Some(limit) if done >= limit) {
            return Err(GridsyncError::store("memory store connection dropped"));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_one(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, GridsyncError> {
        self.check_available().await?;
        Ok(self.get(collection, key).await)
    }

    async fn insert(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<i64, GridsyncError> {
        self.check_available().await?;
        let mut collections = self.collections.lock().await;
        let records = collections.entry(collection.to_string()).or_default();
        if records.contains_key(key) {
            return Err(GridsyncError::store(format!(
                "duplicate key `{key}` in `{collection}`"
            )));
        }
        let now = canonical_timestamp(&Utc::now());
        let row_id = self.next_row_id.fetch_add(1, Ordering::SeqCst) + 1;
        records.insert(
            key.to_string(),
            StoredRecord {
                row_id,
                key: key.to_string(),
                record: record.clone(),
                created_at: now.clone(),
                updated_at: now,
            },
        );
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(row_id)
    }

    async fn replace_if_changed(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<ReplaceOutcome, GridsyncError> {
        self.check_available().await?;
        let mut collections = self.collections.lock().await;
        let Some(stored) = collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(key))
        else {
            return Ok(ReplaceOutcome { changed: false });
        };
        if stored.record.to_json() == record.to_json() {
            return Ok(ReplaceOutcome { changed: false });
        }
        stored.record = record.clone();
        stored.updated_at = canonical_timestamp(&Utc::now());
        self.replaces.fetch_add(1, Ordering::SeqCst);
        Ok(ReplaceOutcome { changed: true })
    }

    async fn count(&self, collection: &str) -> Result<u64, GridsyncError> {
        self.check_available().await?;
        let collections = self.collections.lock().await;
        Ok(collections.get(collection).map_or(0, |r| r.len() as u64))
    }

    async fn query(
        &self,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, GridsyncError> {
        self.check_available().await?;
        let (start, end) = query.bounds_text();
        let collections = self.collections.lock().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<(String, &StoredRecord)> = records
            .values()
            .filter_map(|stored| {
                let time = field_text(&stored.record, &query.time_field)?;
                Some((time, stored))
            })
            .filter(|(time, _)| start.as_ref().is_none_or(|s| time >= s))
            .filter(|(time, _)| end.as_ref().is_none_or(|e| time <= e))
            .filter(|(_, stored)| match &query.equals {
                Some((field, value)) => matches!(
                    stored.record.get(field),
                    Some(FieldValue::Text(text)) if text == value
                ),
                None => true,
            })
            .collect();

        selected.sort_by(|(a_time, a), (b_time, b)| (a_time, &a.key).cmp(&(b_time, &b.key)));
        if query.newest_first {
            selected.reverse();
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(selected
            .into_iter()
            .take(limit)
            .map(|(_, stored)| stored.clone())
            .collect())
    }

    async fn summarize(
        &self,
        collection: &str,
        field: &str,
        group_by: Option<&str>,
    ) -> Result<Vec<FieldSummary>, GridsyncError> {
        self.check_available().await?;
        let collections = self.collections.lock().await;
        let mut groups: BTreeMap<Option<String>, Vec<f64>> = BTreeMap::new();
        for stored in collections.get(collection).into_iter().flat_map(|r| r.values()) {
            let Some(value) = field_number(&stored.record, field) else {
                continue;
            };
            let group = group_by.and_then(|g| field_text(&stored.record, g));
            groups.entry(group).or_default().push(value);
        }

        Ok(groups
            .into_iter()
            .map(|(group, values)| FieldSummary {
                group,
                count: values.len() as u64,
                avg: values.iter().sum::<f64>() / values.len() as f64,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
            .collect())
    }

    async fn health_check(&self) -> Result<HealthStatus, GridsyncError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("marked unavailable".into()));
        }
        Ok(HealthStatus::Healthy)
    }
}
