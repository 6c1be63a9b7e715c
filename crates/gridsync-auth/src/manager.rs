// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential lifecycle: one cached ticket, lazily refreshed.
//!
//! The manager is in one of three phases. `Empty` holds nothing, `Valid`
//! holds a ticket with `now < expires_at`, and `Expired` holds a ticket past
//! its local expiry. Expiry is evaluated on every access against the
//! injected [`Clock`]; there are no timers.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use gridsync_core::{
    AuthEndpoint, Clock, Credential, CredentialPhase, CredentialStatus, CredentialStore,
    GridsyncError,
};

/// How long a freshly issued ticket is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// Lifetime the endpoint grants a ticket.
    pub validity_window: TimeDelta,
    /// Margin subtracted so a ticket is replaced before the server expires it.
    pub safety_buffer: TimeDelta,
}

impl CredentialPolicy {
    pub fn from_secs(validity_window_secs: u64, safety_buffer_secs: u64) -> Self {
        Self {
            validity_window: TimeDelta::seconds(clamp_secs(validity_window_secs)),
            safety_buffer: TimeDelta::seconds(clamp_secs(safety_buffer_secs)),
        }
    }

    /// `validity_window - safety_buffer`.
    pub fn effective_lifetime(&self) -> TimeDelta {
        self.validity_window - self.safety_buffer
    }
}

impl Default for CredentialPolicy {
    /// Two hour window, five minute buffer.
    fn default() -> Self {
        Self::from_secs(7200, 300)
    }
}

fn clamp_secs(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX).min(i64::MAX / 1000)
}

/// Supplies a valid credential, fetching only when necessary.
///
/// Share it behind an `Arc`; the cached credential is guarded by an async
/// mutex that is held across a fetch, so concurrent callers that find the
/// cache stale wait for the one in-flight fetch instead of starting their own.
pub struct CredentialManager {
    store: Arc<dyn CredentialStore>,
    endpoint: Arc<dyn AuthEndpoint>,
    clock: Arc<dyn Clock>,
    policy: CredentialPolicy,
    current: Mutex<Option<Credential>>,
}

impl CredentialManager {
    /// Build a manager, adopting any persisted credential.
    ///
    /// A persisted credential that is still valid is used without contacting
    /// the endpoint. An unreadable cache is logged and treated as empty.
    pub async fn open(
        store: Arc<dyn CredentialStore>,
        endpoint: Arc<dyn AuthEndpoint>,
        clock: Arc<dyn Clock>,
        policy: CredentialPolicy,
    ) -> Self {
        let current = match store.load().await {
            Ok(Some(credential)) => {
                if credential.is_valid_at(clock.now()) {
                    info!(
                        expires_at = %credential.expires_at,
                        "reusing persisted credential"
                    );
                } else {
                    debug!(
                        expires_at = %credential.expires_at,
                        "persisted credential already expired"
                    );
                }
                Some(credential)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "credential cache unreadable, starting empty");
                None
            }
        };

        Self {
            store,
            endpoint,
            clock,
            policy,
            current: Mutex::new(current),
        }
    }

    pub fn policy(&self) -> CredentialPolicy {
        self.policy
    }

    /// Current lifecycle phase, evaluated against the clock.
    pub async fn phase(&self) -> CredentialPhase {
        let now = self.clock.now();
        match self.current.lock().await.as_ref() {
            None => CredentialPhase::Empty,
            Some(c) if c.is_valid_at(now) => CredentialPhase::Valid,
            Some(_) => CredentialPhase::Expired,
        }
    }

    /// Return a credential that is valid now.
    ///
    /// A cached valid credential is returned without network access.
    /// Otherwise exactly one request is made to the endpoint; its failure is
    /// returned as-is and leaves the cached state untouched.
    pub async fn get_valid_credential(&self) -> Result<Credential, GridsyncError> {
        let mut current = self.current.lock().await;

        if let Some(credential) = current.as_ref() {
            if credential.is_valid_at(self.clock.now()) {
                debug!("using cached credential");
                return Ok(credential.clone());
            }
        }

        let token = self.endpoint.request_ticket().await?;
        let issued_at = self.clock.now();
        let credential = Credential {
            token,
            issued_at,
            expires_at: issued_at
                .checked_add_signed(self.policy.effective_lifetime())
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        info!(expires_at = %credential.expires_at, "obtained new credential");

        if let Err(e) = self.store.save(&credential).await {
            warn!(error = %e, "failed to persist credential, keeping it in memory only");
        }

        *current = Some(credential.clone());
        Ok(credential)
    }

    /// Drop the cached credential and its persisted copy.
    ///
    /// Always succeeds; a failure to delete the persisted copy is logged.
    pub async fn invalidate(&self) {
        let mut current = self.current.lock().await;
        *current = None;
        if let Err(e) = self.store.clear().await {
            warn!(error = %e, "failed to delete persisted credential");
        }
        info!("credential invalidated");
    }

    /// Read-only snapshot; never fetches or persists.
    pub async fn status(&self) -> CredentialStatus {
        let now = self.clock.now();
        match self.current.lock().await.as_ref() {
            Some(c) if c.is_valid_at(now) => CredentialStatus {
                valid: true,
                expires_at: Some(c.expires_at),
                time_remaining: Some(c.expires_at - now),
                token_preview: Some(c.token_preview()),
            },
            _ => CredentialStatus::invalid(),
        }
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
