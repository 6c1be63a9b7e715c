// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Canonical timestamp rendering and lenient timestamp parsing.
//!
//! Every timestamp that is stored or compared goes through
//! [`canonical_timestamp`], so two renderings of the same instant (different
//! precision, `Z` vs `+00:00`, local offset) always produce the same string.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// The one stored and compared form: UTC, millisecond precision, `Z` suffix.
pub const CANONICAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Offset-carrying formats tried after RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M%:z", "%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Formats without an offset; interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M",
];

/// Render an instant in the canonical form.
pub fn canonical_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(CANONICAL_TIMESTAMP_FORMAT).to_string()
}

/// Drop sub-millisecond precision, matching what the canonical form keeps.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Parse a timestamp string in any of the notations the upstream APIs emit.
///
/// Returns `None` when the text is not a recognizable timestamp.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn canonical_form_has_millisecond_precision() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(canonical_timestamp(&ts), "2025-01-01T00:00:00.000Z");
    }

    #[test]
    fn equivalent_notations_canonicalize_identically() {
        let forms = [
            "2025-01-01T03:00:00+03:00",
            "2025-01-01T00:00:00Z",
            "2025-01-01T00:00:00.000Z",
            "2025-01-01T00:00:00.000000+00:00",
            "2025-01-01T00:00Z",
            "2025-01-01 00:00:00",
        ];
        for form in forms {
            let parsed = parse_timestamp(form).unwrap_or_else(|| panic!("should parse {form}"));
            assert_eq!(canonical_timestamp(&parsed), "2025-01-01T00:00:00.000Z", "{form}");
        }
    }

    #[test]
    fn truncation_matches_canonical_rendering() {
        let precise = parse_timestamp("2025-01-01T05:12:44.123456Z").unwrap();
        let truncated = truncate_to_millis(precise);
        assert_eq!(canonical_timestamp(&truncated), "2025-01-01T05:12:44.123Z");
        assert_eq!(parse_timestamp("2025-01-01T05:12:44.123Z"), Some(truncated));
    }

    #[test]
    fn non_timestamps_are_rejected() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("TR").is_none());
        assert!(parse_timestamp("12.5").is_none());
    }
}
