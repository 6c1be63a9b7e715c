// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory credential persistence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use gridsync_core::{Credential, CredentialStore, GridsyncError};

/// Credential store backed by a shared slot.
///
/// `fail_saves` makes every `save` and `clear` return a cache error while
/// still counting the attempt; `corrupt` makes `load` fail as if the
/// persisted record were unreadable.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    slot: Arc<Mutex<Option<Credential>>>,
    saves: Arc<AtomicUsize>,
    fail_saves: Arc<AtomicBool>,
    corrupt: Arc<AtomicBool>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a persisted credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(credential))),
            ..Self::default()
        }
    }

    /// Current persisted credential.
    pub async fn stored(&self) -> Option<Credential> {
        self.slot.lock().await.clone()
    }

    /// Number of `save` calls made so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    pub fn set_corrupt(&self, corrupt: bool) {
        self.corrupt.store(corrupt, Ordering::SeqCst);
    }

    fn write_error(&self) -> Option<GridsyncError> {
        self.fail_saves
            .load(Ordering::SeqCst)
            .then(|| GridsyncError::CredentialCache {
                message: "credential store is read-only".into(),
                source: None,
            })
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, GridsyncError> {
        if self.corrupt.load(Ordering::SeqCst) {
            return Err(GridsyncError::CredentialCache {
                message: "persisted credential is unreadable".into(),
                source: None,
            });
        }
        Ok(self.slot.lock().await.clone())
    }

    async fn save(&self, credential: &Credential) -> Result<(), GridsyncError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        *self.slot.lock().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), GridsyncError> {
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        *self.slot.lock().await = None;
        Ok(())
    }
}
