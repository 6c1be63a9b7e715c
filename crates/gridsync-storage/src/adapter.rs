// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the RecordStore trait.

use async_trait::async_trait;
use tracing::debug;

use gridsync_config::model::StorageConfig;
use gridsync_core::{
    FieldSummary, GridsyncError, HealthStatus, Record, RecordQuery, RecordStore, ReplaceOutcome,
    StoredRecord,
};

use crate::database::{Database, map_tr_err};
use crate::queries;

/// SQLite-backed record store.
///
/// Wraps a [`Database`] handle and delegates to the typed query module.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Open the database described by the storage configuration.
    pub async fn open(config: &StorageConfig) -> Result<Self, GridsyncError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite record store initialized");
        Ok(Self { db })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Checkpoint the WAL before shutdown.
    pub async fn close(&self) -> Result<(), GridsyncError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn find_one(
        &self,
        collection: &str,
        key: &str,
    ) -> Result<Option<StoredRecord>, GridsyncError> {
        queries::records::find_one(&self.db, collection, key).await
    }

    async fn insert(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<i64, GridsyncError> {
        queries::records::insert(&self.db, collection, key, record).await
    }

    async fn replace_if_changed(
        &self,
        collection: &str,
        key: &str,
        record: &Record,
    ) -> Result<ReplaceOutcome, GridsyncError> {
        queries::records::replace_if_changed(&self.db, collection, key, record).await
    }

    async fn count(&self, collection: &str) -> Result<u64, GridsyncError> {
        queries::records::count(&self.db, collection).await
    }

    async fn query(
        &self,
        collection: &str,
        query: &RecordQuery,
    ) -> Result<Vec<StoredRecord>, GridsyncError> {
        queries::records::query(&self.db, collection, query).await
    }

    async fn summarize(
        &self,
        collection: &str,
        field: &str,
        group_by: Option<&str>,
    ) -> Result<Vec<FieldSummary>, GridsyncError> {
        queries::records::summarize(&self.db, collection, field, group_by).await
    }

    async fn health_check(&self) -> Result<HealthStatus, GridsyncError> {
        let ping = self
            .db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err);
        Ok(match ping {
            Ok(()) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Unhealthy(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_at_configured_path_and_check_health() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let store = SqliteRecordStore::open(&StorageConfig {
            database_path: db_path.to_str().unwrap().to_string(),
            wal_mode: true,
        })
        .await
        .unwrap();

        assert!(db_path.exists(), "database file should be created");
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
        store.close().await.unwrap();
    }
}
