// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch reconciliation against a record store.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use gridsync_core::{GridsyncError, Record, RecordIdentity, RecordStore, UpsertReport};

use crate::collection::Collection;
use crate::identity::identity_of;
use crate::normalize::{data_equal, normalize_record};

/// Upsert engine bound to one store.
#[derive(Clone)]
pub struct UpsertEngine {
    store: Arc<dyn RecordStore>,
}

impl UpsertEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Reconcile `records` with the store. See [`apply`].
    pub async fn apply(
        &self,
        records: Vec<Record>,
        collection: &Collection,
    ) -> Result<UpsertReport, GridsyncError> {
        apply(records, collection, self.store.as_ref()).await
    }
}

/// Reconcile a batch of records with `store`.
///
/// Each record is normalized and keyed. Records without a complete key are
/// counted as malformed and skipped. When a key occurs more than once, only
/// its last occurrence is applied and the earlier ones are counted as
/// superseded. Each remaining record is then inserted, replaced in full, or
/// left alone, in the order of its last occurrence.
///
/// A store failure stops the batch and is returned as
/// [`GridsyncError::StoreUnavailable`]; writes made before it stay committed.
pub async fn apply(
    records: Vec<Record>,
    collection: &Collection,
    store: &dyn RecordStore,
) -> Result<UpsertReport, GridsyncError> {
    let mut report = UpsertReport::new(collection.name());

    let mut keyed: Vec<(RecordIdentity, Record)> = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let normalized = normalize_record(record, collection);
        match identity_of(&normalized, collection) {
            Ok(identity) => keyed.push((identity, normalized)),
            Err(e) => {
                warn!(collection = collection.name(), index, error = %e, "skipping malformed record");
                report.malformed += 1;
            }
        }
    }

    let mut last_occurrence: HashMap<RecordIdentity, usize> = HashMap::with_capacity(keyed.len());
    for (position, (identity, _)) in keyed.iter().enumerate() {
        last_occurrence.insert(identity.clone(), position);
    }

    for (position, (identity, record)) in keyed.into_iter().enumerate() {
        if last_occurrence.get(&identity) != Some(&position) {
            debug!(collection = collection.name(), key = %identity, "superseded by a later duplicate");
            report.superseded += 1;
            continue;
        }

        if let Err(e) = reconcile(&identity, &record, collection, store, &mut report).await {
            error!(
                collection = collection.name(),
                key = %identity,
                inserted = report.inserted,
                updated = report.updated,
                skipped = report.skipped,
                error = %e,
                "store failed, aborting batch"
            );
            return Err(match e {
                e @ GridsyncError::StoreUnavailable { .. } => e,
                other => GridsyncError::store(other),
            });
        }
        report.touched.push(identity);
    }

    info!(
        collection = collection.name(),
        inserted = report.inserted,
        updated = report.updated,
        skipped = report.skipped,
        malformed = report.malformed,
        superseded = report.superseded,
        "upsert batch applied"
    );
    Ok(report)
}

async fn reconcile(
    identity: &RecordIdentity,
    record: &Record,
    collection: &Collection,
    store: &dyn RecordStore,
    report: &mut UpsertReport,
) -> Result<(), GridsyncError> {
    let key = identity.key();

    let Some(existing) = store.find_one(collection.name(), &key).await? else {
        let row_id = store.insert(collection.name(), &key, record).await?;
        debug!(collection = collection.name(), key = %key, row_id, "inserted");
        report.inserted += 1;
        return Ok(());
    };

    if data_equal(&existing.record, record, collection) {
        debug!(collection = collection.name(), key = %key, "unchanged");
        report.skipped += 1;
        return Ok(());
    }

    let outcome = store.replace_if_changed(collection.name(), &key, record).await?;
    if outcome.changed {
        debug!(collection = collection.name(), key = %key, row_id = existing.row_id, "replaced");
        report.updated += 1;
    } else {
        debug!(collection = collection.name(), key = %key, "replace matched but changed nothing");
        report.skipped += 1;
    }
    Ok(())
}
