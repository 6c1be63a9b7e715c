// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across gridsync crates.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::time::canonical_timestamp;

// --- Credentials ---

/// A cached session ticket issued by the authentication endpoint.
///
/// `expires_at` already has the safety buffer subtracted; the credential is
/// valid iff `now < expires_at`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque bearer token.
    pub token: String,
    /// When the endpoint issued the token (local clock).
    pub issued_at: DateTime<Utc>,
    /// Local expiry, safety buffer included.
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Whether the credential may still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// First 20 characters of the token followed by an ellipsis.
    pub fn token_preview(&self) -> String {
        let prefix: String = self.token.chars().take(20).collect();
        format!("{prefix}...")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Lifecycle phase of the credential manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum CredentialPhase {
    /// Nothing cached; the next request fetches.
    Empty,
    /// A credential is cached and `now < expires_at`.
    Valid,
    /// A credential is cached but past its local expiry.
    Expired,
}

/// Read-only snapshot of the credential manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStatus {
    pub valid: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub time_remaining: Option<TimeDelta>,
    pub token_preview: Option<String>,
}

impl CredentialStatus {
    /// Status reported when no usable credential is held.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            expires_at: None,
            time_remaining: None,
            token_preview: None,
        }
    }
}

// --- Records ---

/// A single field value of a normalized record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Returns `true` for explicit nulls and non-finite floats.
    pub fn is_null_like(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    /// Convert to the JSON representation used by the store.
    ///
    /// Timestamps render canonically and non-finite floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Integer(i) => serde_json::Value::from(*i),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Text(s) => serde_json::Value::String(s.clone()),
            FieldValue::Timestamp(ts) => serde_json::Value::String(canonical_timestamp(ts)),
        }
    }

    /// Convert from a JSON scalar. Nested arrays and objects are kept as their
    /// compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

/// A flat record: field name to value, ordered by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Serialize to a JSON object (field order is the map order, so the text
    /// is deterministic for equal records).
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Build a record from a JSON object. Returns `None` for non-objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let fields = object
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect();
        Some(Self { fields })
    }
}

impl FromIterator<(String, FieldValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Composite natural key of a record: ordered `(field, value)` pairs.
///
/// Values are held as compact JSON literals, so `1` and `"1"` are distinct
/// keys. A timestamp keys as its canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordIdentity {
    parts: Vec<(String, String)>,
}

impl RecordIdentity {
    pub fn new(parts: Vec<(String, serde_json::Value)>) -> Self {
        Self {
            parts: parts
                .into_iter()
                .map(|(field, value)| (field, value.to_string()))
                .collect(),
        }
    }

    /// `(field, JSON literal)` pairs in key order.
    pub fn parts(&self) -> &[(String, String)] {
        &self.parts
    }

    /// Storage key: a JSON array of `[field, value]` pairs, e.g.
    /// `[["datetime","2025-01-01T00:00:00.000Z"],["zone","TR"]]`.
    pub fn key(&self) -> String {
        let pairs: Vec<String> = self
            .parts
            .iter()
            .map(|(field, value)| format!("[{},{value}]", serde_json::Value::from(field.as_str())))
            .collect();
        format!("[{}]", pairs.join(","))
    }
}

impl fmt::Display for RecordIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A record as held by a store, with storage-assigned metadata kept apart
/// from the data fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub row_id: i64,
    pub key: String,
    pub record: Record,
    pub created_at: String,
    pub updated_at: String,
}

/// Read-side selection over one collection, ordered by a time field.
///
/// Records lacking `time_field` are never returned. Bounds are inclusive and
/// compare by canonical timestamp text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub time_field: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    /// Keep only records whose field equals this text, e.g. `("zone", "TR")`.
    pub equals: Option<(String, String)>,
    pub newest_first: bool,
    pub limit: Option<usize>,
}

impl RecordQuery {
    /// The `limit` most recent records.
    pub fn latest(time_field: impl Into<String>, limit: usize) -> Self {
        Self {
            time_field: time_field.into(),
            start: None,
            end: None,
            equals: None,
            newest_first: true,
            limit: Some(limit),
        }
    }

    /// Every record in `[start, end]`, oldest first.
    pub fn between(time_field: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            time_field: time_field.into(),
            start: Some(start),
            end: Some(end),
            equals: None,
            newest_first: false,
            limit: None,
        }
    }

    pub fn with_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.equals = Some((field.into(), value.into()));
        self
    }

    /// Canonical text of the bounds, as stored in record JSON.
    pub fn bounds_text(&self) -> (Option<String>, Option<String>) {
        (
            self.start.as_ref().map(canonical_timestamp),
            self.end.as_ref().map(canonical_timestamp),
        )
    }
}

/// Aggregate of one numeric field over a group of records.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSummary {
    /// Value of the grouping field, `None` when ungrouped or absent.
    pub group: Option<String>,
    pub count: u64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for FieldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: count {}, avg {:.2}, min {}, max {}",
            self.group.as_deref().unwrap_or("(all)"),
            self.count,
            self.avg,
            self.min,
            self.max
        )
    }
}

/// Result of a conditional full replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// `false` when the stored row already held exactly these values.
    pub changed: bool,
}

/// Per-batch outcome of the upsert engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    pub collection: String,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Records excluded because their identity could not be computed.
    pub malformed: usize,
    /// Earlier duplicates of an identity dropped in favor of a later one.
    pub superseded: usize,
    /// Identities reconciled in this call, in processing order.
    pub touched: Vec<RecordIdentity>,
}

impl UpsertReport {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Number of identities that were reconciled against the store.
    pub fn reconciled(&self) -> usize {
        self.inserted + self.updated + self.skipped
    }

    /// Number of writes issued that changed stored data.
    pub fn writes(&self) -> usize {
        self.inserted + self.updated
    }
}

impl fmt::Display for UpsertReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: inserted {}, updated {}, skipped {}",
            self.collection, self.inserted, self.updated, self.skipped
        )?;
        if self.malformed > 0 {
            write!(f, ", malformed {}", self.malformed)?;
        }
        if self.superseded > 0 {
            write!(f, ", superseded {}", self.superseded)?;
        }
        Ok(())
    }
}

// --- Health ---

/// Health status reported by store health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credential(expires_in_minutes: i64) -> Credential {
        let issued_at = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        Credential {
            token: "TGT-1234567890-abcdefghijklmnop-cas".into(),
            issued_at,
            expires_at: issued_at + TimeDelta::minutes(expires_in_minutes),
        }
    }

    #[test]
    fn credential_validity_is_strictly_before_expiry() {
        let cred = credential(115);
        assert!(cred.is_valid_at(cred.issued_at));
        assert!(cred.is_valid_at(cred.expires_at - TimeDelta::seconds(1)));
        assert!(!cred.is_valid_at(cred.expires_at));
    }

    #[test]
    fn credential_debug_redacts_token() {
        let cred = credential(115);
        let debug = format!("{cred:?}");
        assert!(!debug.contains("TGT-1234567890"));
        assert!(debug.contains("REDACTED"));
        assert_eq!(cred.token_preview(), "TGT-1234567890-abcde...");
    }

    #[test]
    fn credential_serializes_with_cache_field_names() {
        let cred = credential(115);
        let json = serde_json::to_value(&cred).unwrap();
        assert!(json.get("token").is_some());
        assert!(json.get("issued_at").is_some());
        assert!(json.get("expires_at").is_some());
        let back: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn identity_key_is_a_json_array_of_pairs() {
        let id = RecordIdentity::new(vec![
            ("datetime".into(), "2025-01-01T00:00:00.000Z".into()),
            ("zone".into(), "TR".into()),
        ]);
        assert_eq!(id.key(), r#"[["datetime","2025-01-01T00:00:00.000Z"],["zone","TR"]]"#);
        assert_eq!(id.to_string(), id.key());
        let parsed: serde_json::Value = serde_json::from_str(&id.key()).unwrap();
        assert_eq!(parsed[1][1], "TR");
    }

    #[test]
    fn separators_in_values_cannot_collide() {
        let left = RecordIdentity::new(vec![("a".into(), "x|b=y".into()), ("b".into(), "z".into())]);
        let right = RecordIdentity::new(vec![("a".into(), "x".into()), ("b".into(), "y|b=z".into())]);
        assert_ne!(left.key(), right.key());

        let quoted = RecordIdentity::new(vec![("a".into(), r#"x","b"#.into())]);
        let split = RecordIdentity::new(vec![("a".into(), "x".into()), ("b".into(), "".into())]);
        assert_ne!(quoted.key(), split.key());
    }

    #[test]
    fn latest_query_is_newest_first_and_bounded() {
        let query = RecordQuery::latest("datetime", 5).with_equals("zone", "TR");
        assert!(query.newest_first);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.equals, Some(("zone".into(), "TR".into())));
        assert_eq!(query.bounds_text(), (None, None));

        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let range = RecordQuery::between("datetime", start, start + TimeDelta::hours(1));
        assert!(!range.newest_first);
        assert_eq!(
            range.bounds_text(),
            (
                Some("2025-01-01T00:00:00.000Z".into()),
                Some("2025-01-01T01:00:00.000Z".into())
            )
        );
    }

    #[test]
    fn summary_display_names_the_group() {
        let summary = FieldSummary {
            group: Some("TR".into()),
            count: 3,
            avg: 410.0 / 3.0,
            min: 120.0,
            max: 170.0,
        };
        assert_eq!(summary.to_string(), "TR: count 3, avg 136.67, min 120, max 170");
    }

    #[test]
    fn identity_keeps_value_type() {
        let number = RecordIdentity::new(vec![("id".into(), serde_json::json!(1))]);
        let text = RecordIdentity::new(vec![("id".into(), serde_json::json!("1"))]);
        assert_ne!(number, text);
        assert_eq!(number.key(), r#"[["id",1]]"#);
        assert_eq!(text.key(), r#"[["id","1"]]"#);
    }

    #[test]
    fn field_value_json_conversions() {
        assert_eq!(FieldValue::Float(f64::NAN).to_json(), serde_json::Value::Null);
        assert!(FieldValue::Float(f64::INFINITY).is_null_like());
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(10)),
            FieldValue::Integer(10)
        );
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(10.5)),
            FieldValue::Float(10.5)
        );
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            FieldValue::Timestamp(ts).to_json(),
            serde_json::json!("2025-01-01T00:00:00.000Z")
        );
        assert_eq!(FieldValue::from(None::<f64>), FieldValue::Null);
    }

    #[test]
    fn record_json_is_deterministic() {
        let a = Record::new().with("zone", "TR").with("value", 10i64);
        let b = Record::new().with("value", 10i64).with("zone", "TR");
        assert_eq!(a.to_json().to_string(), b.to_json().to_string());
        let back = Record::from_json(&a.to_json()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn report_display_omits_zero_extras() {
        let mut report = UpsertReport::new("power_data");
        report.inserted = 2;
        report.skipped = 1;
        assert_eq!(
            report.to_string(),
            "power_data: inserted 2, updated 0, skipped 1"
        );
        report.malformed = 1;
        assert!(report.to_string().ends_with("malformed 1"));
        assert_eq!(report.reconciled(), 3);
        assert_eq!(report.writes(), 2);
    }
}
