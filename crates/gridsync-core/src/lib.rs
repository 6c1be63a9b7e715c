// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for gridsync.
//!
//! This crate provides the error taxonomy, domain types, and adapter traits
//! shared by the credential manager, the upsert engine, the storage backend,
//! and the data source clients.

pub mod error;
pub mod time;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GridsyncError;
pub use time::{
    CANONICAL_TIMESTAMP_FORMAT, canonical_timestamp, parse_timestamp, truncate_to_millis,
};
pub use types::{
    Credential, CredentialPhase, CredentialStatus, FieldSummary, FieldValue, HealthStatus,
    Record, RecordIdentity, RecordQuery, ReplaceOutcome, StoredRecord, UpsertReport,
};

pub use traits::{AuthEndpoint, Clock, CredentialStore, RecordStore, SystemClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gridsync_error_has_all_variants() {
        let _auth = GridsyncError::Auth {
            message: "test".into(),
            source: None,
        };
        let _rejected = GridsyncError::CredentialRejected { status: 401 };
        let _malformed = GridsyncError::MalformedRecord {
            collection: "power_data".into(),
            missing: vec!["zone".into()],
        };
        let _store = GridsyncError::StoreUnavailable {
            source: Box::new(std::io::Error::other("test")),
        };
        let _cache = GridsyncError::CredentialCache {
            message: "test".into(),
            source: None,
        };
        let _fetch = GridsyncError::Fetch {
            message: "test".into(),
            source: None,
        };
        let _normalize = GridsyncError::Normalize("test".into());
        let _config = GridsyncError::Config("test".into());
        let _internal = GridsyncError::Internal("test".into());
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_credential_store<T: CredentialStore>() {}
        fn _assert_auth_endpoint<T: AuthEndpoint>() {}
        fn _assert_record_store<T: RecordStore>() {}
        fn _assert_clock<T: Clock>() {}
        _assert_clock::<SystemClock>();
    }
}
