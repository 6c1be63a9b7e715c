// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Natural key derivation.

use gridsync_core::{GridsyncError, Record, RecordIdentity};

use crate::collection::Collection;

/// Compute the identity of a normalized record.
///
/// Every key field must be present and non-null; otherwise the record is
/// malformed and the missing fields are reported. Key values keep their
/// type: an integer `1` and the text `"1"` are different identities.
pub fn identity_of(record: &Record, collection: &Collection) -> Result<RecordIdentity, GridsyncError> {
    let mut parts = Vec::with_capacity(collection.key_fields().len());
    let mut missing = Vec::new();

    for field in collection.key_fields() {
        match record.get(field).filter(|v| !v.is_null_like()) {
            Some(value) => parts.push((field.clone(), value.to_json())),
            None => missing.push(field.clone()),
        }
    }

    if missing.is_empty() {
        Ok(RecordIdentity::new(parts))
    } else {
        Err(GridsyncError::MalformedRecord {
            collection: collection.name().to_string(),
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_record;
    use gridsync_core::FieldValue;

    #[test]
    fn composite_key_follows_declared_order() {
        let collection =
            Collection::new("power_data", ["datetime", "zone"]).with_timestamp_fields(["datetime"]);
        let record = normalize_record(
            &Record::new()
                .with("zone", "TR")
                .with("datetime", "2025-01-01T03:00:00+03:00"),
            &collection,
        );
        let identity = identity_of(&record, &collection).unwrap();
        assert_eq!(identity.key(), r#"[["datetime","2025-01-01T00:00:00.000Z"],["zone","TR"]]"#);
    }

    #[test]
    fn null_key_field_is_malformed() {
        let collection = Collection::new("power_data", ["datetime", "zone"]);
        let record = Record::new()
            .with("datetime", "2025-01-01T00:00:00Z")
            .with("zone", FieldValue::Null);
        match identity_of(&record, &collection) {
            Err(GridsyncError::MalformedRecord { missing, .. }) => {
                assert_eq!(missing, vec!["zone".to_string()]);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn integer_and_text_keys_differ() {
        let collection = Collection::new("readings", ["id"]);
        let number = identity_of(&Record::new().with("id", 1i64), &collection).unwrap();
        let text = identity_of(&Record::new().with("id", "1"), &collection).unwrap();
        assert_ne!(number, text);
        assert_ne!(number.key(), text.key());
    }
}
