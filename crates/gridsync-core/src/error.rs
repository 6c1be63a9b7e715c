// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for gridsync.
//!
//! Single-record problems ([`GridsyncError::MalformedRecord`]) are absorbed by
//! the upsert engine; everything else propagates and ends the current run for
//! the affected source.

use thiserror::Error;

/// The primary error type used across all gridsync crates.
#[derive(Debug, Error)]
pub enum GridsyncError {
    /// The authentication endpoint was unreachable or refused the shared secret.
    #[error("authentication failed: {message}")]
    Auth {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A data call rejected a credential that looked valid locally.
    #[error("credential rejected by data endpoint (HTTP {status})")]
    CredentialRejected { status: u16 },

    /// A record lacks the fields needed to compute its identity.
    #[error("malformed record in `{collection}`: missing key fields {missing:?}")]
    MalformedRecord {
        collection: String,
        missing: Vec<String>,
    },

    /// The record store could not complete an operation.
    #[error("store unavailable: {source}")]
    StoreUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The persisted credential cache could not be read, written, or removed.
    #[error("credential cache error: {message}")]
    CredentialCache {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A data endpoint call failed for a reason other than credential rejection.
    #[error("fetch failed: {message}")]
    Fetch {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A fetched payload could not be turned into records.
    #[error("normalization failed: {0}")]
    Normalize(String),

    /// Configuration errors (invalid TOML, missing required fields, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GridsyncError {
    /// Returns `true` if this error is a data endpoint rejecting the credential.
    pub fn is_credential_rejection(&self) -> bool {
        matches!(self, GridsyncError::CredentialRejected { .. })
    }

    /// Builds a [`GridsyncError::StoreUnavailable`] from any error source.
    pub fn store(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        GridsyncError::StoreUnavailable {
            source: source.into(),
        }
    }
}
