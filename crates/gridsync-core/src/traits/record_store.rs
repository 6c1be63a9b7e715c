// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyed record persistence consumed by the upsert engine.

use async_trait::async_trait;

use crate::error::GridsyncError;
use crate::types::{
    FieldSummary, HealthStatus, Record, RecordQuery, ReplaceOutcome, StoredRecord,
};

/// A keyed store of records, partitioned into named collections.
///
/// Every error is reported as [`GridsyncError::StoreUnavailable`]; the upsert
/// engine treats any of them as fatal for the rest of the batch.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns the stored record for `key`, if any.
    async fn find_one(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, GridsyncError>;

    /// Inserts a new record and returns its storage row id.
    async fn insert(&self, collection: &str, key: &str, record: &Record)
    -> Result<i64, GridsyncError>;

    /// Replaces the whole stored record for `key` if its data differs.
    ///
    /// The comparison happens on the store side in the same operation as the
    /// write, so a concurrent writer that already applied the same values
    /// yields `changed: false`.
    async fn replace_if_changed(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<ReplaceOutcome, GridsyncError>;

    /// Number of records held in `collection`.
    async fn count(&self, collection: &str) -> Result<u64, GridsyncError>;

    /// Records of `collection` selected and ordered by `query`.
    async fn query(
        &self,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, GridsyncError>;

    /// Count, average, minimum and maximum of the numeric `field`, one row per
    /// distinct `group_by` value (or a single row when `group_by` is `None`).
    ///
    /// Records where `field` is absent or not a number are ignored.
    async fn summarize(
        &self,
        collection: &str,
        field: &str,
        group_by: Option<&str>,
    ) -> Result<Vec<FieldSummary>, GridsyncError>;

    /// Cheap connectivity check.
    async fn health_check(&self) -> Result<HealthStatus, GridsyncError>;
}
