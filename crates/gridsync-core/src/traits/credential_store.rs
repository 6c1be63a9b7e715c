// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable persistence of the single cached credential.

use async_trait::async_trait;

use crate::error::GridsyncError;
use crate::types::Credential;

/// Key-value persistence for one credential record.
///
/// Implementations must survive process restarts; the credential manager
/// reads on startup, overwrites on every refresh, and clears on invalidation.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the persisted credential.
    ///
    /// # Returns
    /// - `Ok(Some(credential))` if one is stored
    /// - `Ok(None)` if nothing is stored
    /// - `Err(GridsyncError::CredentialCache)` if the record is unreadable
    async fn load(&self) -> Result<Option<Credential>, GridsyncError>;

    /// Replace the persisted credential.
    async fn save(&self, credential: &Credential) -> Result<(), GridsyncError>;

    /// Remove the persisted credential. Clearing an empty store is not an error.
    async fn clear(&self) -> Result<(), GridsyncError>;
}
