// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical record form and data equality.
//!
//! Normalization is applied identically to incoming and stored records:
//!
//! - metadata fields are dropped
//! - nulls and non-finite floats are dropped, so a missing field and an
//!   explicit null are the same thing
//! - declared timestamp fields holding parseable text become timestamps, and
//!   every timestamp is truncated to millisecond precision
//! - floats with no fractional part become integers
//!
//! Two data-equal records therefore normalize to the same [`Record`], and
//! serialize to the same JSON.

use tracing::debug;

use gridsync_core::{
    FieldValue, Record, canonical_timestamp, parse_timestamp, truncate_to_millis,
};

use crate::collection::Collection;

/// Largest magnitude at which every integer is exactly representable as f64.
const EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Bring `record` into canonical form for `collection`.
pub fn normalize_record(record: &Record, collection: &Collection) -> Record {
    record
        .iter()
        .filter(|(name, _)| !collection.is_metadata_field(name))
        .filter_map(|(name, value)| {
            normalize_value(name, value, collection).map(|v| (name.to_string(), v))
        })
        .collect()
}

fn normalize_value(name: &str, value: &FieldValue, collection: &Collection) -> Option<FieldValue> {
    if value.is_null_like() {
        return None;
    }
    let normalized = match value {
        FieldValue::Text(text) if collection.is_timestamp_field(name) => {
            match parse_timestamp(text) {
                Some(ts) => FieldValue::Timestamp(truncate_to_millis(ts)),
                None => {
                    debug!(
                        collection = collection.name(),
                        field = name,
                        value = %text,
                        "timestamp field is not a recognizable timestamp, kept as text"
                    );
                    value.clone()
                }
            }
        }
        FieldValue::Timestamp(ts) => FieldValue::Timestamp(truncate_to_millis(*ts)),
        FieldValue::Float(f) if f.fract() == 0.0 && f.abs() < EXACT_F64_INT => {
            FieldValue::Integer(*f as i64)
        }
        other => other.clone(),
    };
    Some(normalized)
}

/// Whether two records carry the same data.
///
/// Compares the union of non-metadata field names after normalizing both
/// sides. A field absent on one side equals null on the other.
pub fn data_equal(a: &Record, b: &Record, collection: &Collection) -> bool {
    let a = normalize_record(a, collection);
    let b = normalize_record(b, collection);

    let names: std::collections::BTreeSet<&str> = a.field_names().chain(b.field_names()).collect();
    names.into_iter().all(|name| match (a.get(name), b.get(name)) {
        (Some(x), Some(y)) => values_equal(x, y),
        (None, None) => true,
        _ => false,
    })
}

fn values_equal(a: &FieldValue, b: &FieldValue) -> bool {
    use FieldValue::*;

    match (a, b) {
        (Integer(x), Integer(y)) => x == y,
        (Float(x), Float(y)) => x == y,
        (Integer(i), Float(f)) | (Float(f), Integer(i)) => (*i as f64) == *f,
        (Timestamp(x), Timestamp(y)) => x == y,
        (Timestamp(ts), Text(s)) | (Text(s), Timestamp(ts)) => {
            canonical_timestamp(ts) == *s
                || parse_timestamp(s).is_some_and(|parsed| truncate_to_millis(parsed) == *ts)
        }
        (x, y) => x == y,
    }
}
