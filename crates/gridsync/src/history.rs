// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-side views over the ingested collections.

use chrono::{DateTime, Utc};

use gridsync_core::{FieldSummary, GridsyncError, RecordQuery, RecordStore, StoredRecord};
use gridsync_sources::{carbon_collection, consumption_collection, power_collection};

use crate::pipeline::SourceKind;

/// Every collection orders by this field.
pub const TIME_FIELD: &str = "datetime";

/// Field that partitions the Electricity Maps collections.
pub const ZONE_FIELD: &str = "zone";

impl SourceKind {
    /// Name of the collection this source lands in.
    pub fn collection_name(self) -> String {
        let collection = match self {
            SourceKind::Epias => consumption_collection(),
            SourceKind::Power => power_collection(),
            SourceKind::Carbon => carbon_collection(),
        };
        collection.name().to_string()
    }

    /// Headline numeric field summarized by default.
    pub fn metric(self) -> &'static str {
        match self {
            SourceKind::Epias => "consumption_mwh",
            SourceKind::Power => "powerConsumptionTotal",
            SourceKind::Carbon => "carbonIntensity",
        }
    }

    fn is_zoned(self) -> bool {
        !matches!(self, SourceKind::Epias)
    }
}

fn zone_filter(
    query: RecordQuery,
    source: SourceKind,
    zone: Option<&str>,
) -> Result<RecordQuery, GridsyncError> {
    match zone {
        None => Ok(query),
        Some(zone) if source.is_zoned() => Ok(query.with_equals(ZONE_FIELD, zone)),
        Some(_) => Err(GridsyncError::Config(format!(
            "{source} records carry no {ZONE_FIELD}"
        ))),
    }
}

/// The `limit` most recent records of `source`, newest first.
pub async fn latest(
    store: &dyn RecordStore,
    source: SourceKind,
    zone: Option<&str>,
    limit: usize,
) -> Result<Vec<StoredRecord>, GridsyncError> {
    let query = zone_filter(RecordQuery::latest(TIME_FIELD, limit), source, zone)?;
    store.query(&source.collection_name(), &query).await
}

/// Records of `source` with `start <= datetime <= end`, oldest first.
pub async fn range(
    store: &dyn RecordStore,
    source: SourceKind,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    zone: Option<&str>,
) -> Result<Vec<StoredRecord>, GridsyncError> {
    if end < start {
        return Err(GridsyncError::Config(format!(
            "range end {end} is before start {start}"
        )));
    }
    let query = zone_filter(RecordQuery::between(TIME_FIELD, start, end), source, zone)?;
    store.query(&source.collection_name(), &query).await
}

/// Count, average, minimum and maximum of `field` (default: the source's
/// metric), per zone where the source has zones.
pub async fn stats(
    store: &dyn RecordStore,
    source: SourceKind,
    field: Option<&str>,
) -> Result<Vec<FieldSummary>, GridsyncError> {
    let field = field.unwrap_or(source.metric());
    let group_by = source.is_zoned().then_some(ZONE_FIELD);
    store.summarize(&source.collection_name(), field, group_by).await
}

/// One line per record: the time field, then the data as compact JSON.
pub fn render_record(stored: &StoredRecord) -> String {
    let when = stored
        .record
        .get(TIME_FIELD)
        .map(|v| match v.to_json() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_default();
    format!("{when}  {}", stored.record.to_json())
}
