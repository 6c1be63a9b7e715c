// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record lookups and writes.
//!
//! `fields` holds the record as compact JSON with keys in sorted order, so
//! two data-equal normalized records always serialize to identical text.

use rusqlite::params;
use rusqlite::types::Type;

use gridsync_core::{FieldSummary, GridsyncError, Record, RecordQuery, ReplaceOutcome, StoredRecord};

use crate::database::{Database, map_tr_err};

const NOW: &str = "strftime('%Y-%m-%dT%H:%M:%fZ', 'now')";

fn encode(record: &Record) -> String {
    record.to_json().to_string()
}

fn decode(column: usize, text: &str) -> Result<Record, rusqlite::Error> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))?;
    Record::from_json(&value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            column,
            Type::Text,
            format!("stored fields are not a JSON object: {text}").into(),
        )
    })
}

/// JSON path selecting a top-level field by name.
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', "\\\""))
}

fn stored_from_row(row: &rusqlite::Row<'_>) -> Result<StoredRecord, rusqlite::Error> {
    let fields: String = row.get(2)?;
    Ok(StoredRecord {
        row_id: row.get(0)?,
        key: row.get(1)?,
        record: decode(2, &fields)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> Result<FieldSummary, rusqlite::Error> {
    let count: i64 = row.get(1)?;
    Ok(FieldSummary {
        group: row.get(0)?,
        count: count.max(0) as u64,
        avg: row.get(2)?,
        min: row.get(3)?,
        max: row.get(4)?,
    })
}

/// Fetch the record stored under `key` in `collection`.
pub async fn find_one(
    db: &Database,
    collection: &str,
    key: &str,
) -> Result<Option<StoredRecord>, GridsyncError> {
    let collection = collection.to_string();
    let key = key.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<StoredRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(
                "SELECT id, record_key, fields, created_at, updated_at
                 FROM records WHERE collection = ?1 AND record_key = ?2",
            )?;
            let result = stmt.query_row(params![collection, key], stored_from_row);
            match result {
                Ok(stored) => Ok(Some(stored)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Insert a new record, returning its row id.
///
/// Fails if `key` already exists in `collection`.
pub async fn insert(
    db: &Database,
    collection: &str,
    key: &str,
    record: &Record,
) -> Result<i64, GridsyncError> {
    let collection = collection.to_string();
    let key = key.to_string();
    let fields = encode(record);
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                &format!(
                    "INSERT INTO records (collection, record_key, fields, created_at, updated_at)
                     VALUES (?1, ?2, ?3, {NOW}, {NOW})"
                ),
                params![collection, key, fields],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(map_tr_err)
}

/// Replace the stored fields only when they differ from `record`.
///
/// The comparison is part of the `UPDATE` itself, so `changed` reflects
/// what the database actually did.
pub async fn replace_if_changed(
    db: &Database,
    collection: &str,
    key: &str,
    record: &Record,
) -> Result<ReplaceOutcome, GridsyncError> {
    let collection = collection.to_string();
    let key = key.to_string();
    let fields = encode(record);
    db.connection()
        .call(move |conn| -> Result<ReplaceOutcome, rusqlite::Error> {
            let changed = conn.execute(
                &format!(
                    "UPDATE records SET fields = ?3, updated_at = {NOW}
                     WHERE collection = ?1 AND record_key = ?2 AND fields IS NOT ?3"
                ),
                params![collection, key, fields],
            )?;
            Ok(ReplaceOutcome {
                changed: changed > 0,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Count the records in `collection`.
pub async fn count(db: &Database, collection: &str) -> Result<u64, GridsyncError> {
    let collection = collection.to_string();
    db.connection()
        .call(move |conn| -> Result<u64, rusqlite::Error> {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM records WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )?;
            Ok(count.max(0) as u64)
        })
        .await
        .map_err(map_tr_err)
}

/// Select records of `collection` by time range and optional field equality.
///
/// Time bounds compare the stored canonical text, which sorts chronologically.
pub async fn query(
    db: &Database,
    collection: &str,
    query: &RecordQuery,
) -> Result<Vec<StoredRecord>, GridsyncError> {
    let collection = collection.to_string();
    let time_path = json_path(&query.time_field);
    let (start, end) = query.bounds_text();
    let (equals_path, equals_value) = match &query.equals {
        Some((field, value)) => (Some(json_path(field)), Some(value.clone())),
        None => (None, None),
    };
    let limit = query.limit.map_or(-1, |n| i64::try_from(n).unwrap_or(i64::MAX));
    let direction = if query.newest_first { "DESC" } else { "ASC" };
    db.connection()
        .call(move |conn| -> Result<Vec<StoredRecord>, rusqlite::Error> {
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT id, record_key, fields, created_at, updated_at
                 FROM records
                 WHERE collection = ?1
                   AND json_extract(fields, ?2) IS NOT NULL
                   AND (?3 IS NULL OR json_extract(fields, ?2) >= ?3)
                   AND (?4 IS NULL OR json_extract(fields, ?2) <= ?4)
                   AND (?5 IS NULL OR json_extract(fields, ?5) = ?6)
                 ORDER BY json_extract(fields, ?2) {direction}, record_key {direction}
                 LIMIT ?7"
            ))?;
            let rows = stmt.query_map(
                params![collection, time_path, start, end, equals_path, equals_value, limit],
                stored_from_row,
            )?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Aggregate the numeric `field` of `collection`, grouped by `group_by`.
pub async fn summarize(
    db: &Database,
    collection: &str,
    field: &str,
    group_by: Option<&str>,
) -> Result<Vec<FieldSummary>, GridsyncError> {
    let collection = collection.to_string();
    let field_path = json_path(field);
    let group_path = group_by.map(json_path);
    db.connection()
        .call(move |conn| -> Result<Vec<FieldSummary>, rusqlite::Error> {
            let group_expr = if group_path.is_some() {
                "json_extract(fields, ?3)"
            } else {
                "NULL"
            };
            let mut stmt = conn.prepare_cached(&format!(
                "SELECT CAST(g AS TEXT), COUNT(v), AVG(v), MIN(v), MAX(v)
                 FROM (SELECT json_extract(fields, ?2) AS v, {group_expr} AS g
                       FROM records WHERE collection = ?1)
                 WHERE typeof(v) IN ('integer', 'real')
                 GROUP BY g
                 ORDER BY g"
            ))?;
            let rows = match &group_path {
                Some(group_path) => stmt.query_map(
                    params![collection, field_path, group_path],
                    summary_from_row,
                )?,
                None => stmt.query_map(params![collection, field_path], summary_from_row)?,
            };
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
