// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential lifecycle tests against in-memory doubles.

use std::sync::Arc;

use chrono::TimeDelta;
use gridsync_auth::{CredentialManager, CredentialPolicy, FileCredentialStore};
use gridsync_core::{Clock, Credential, CredentialPhase, CredentialStore, GridsyncError};
use gridsync_test_utils::{InMemoryCredentialStore, ManualClock, MockAuthEndpoint};

struct Fixture {
    store: InMemoryCredentialStore,
    endpoint: MockAuthEndpoint,
    clock: ManualClock,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: InMemoryCredentialStore::new(),
            endpoint: MockAuthEndpoint::new(),
            clock: ManualClock::default(),
        }
    }

    async fn manager(&self) -> CredentialManager {
        CredentialManager::open(
            Arc::new(self.store.clone()),
            Arc::new(self.endpoint.clone()),
            Arc::new(self.clock.clone()),
            CredentialPolicy::default(),
        )
        .await
    }
}

#[tokio::test]
async fn starts_empty_without_persisted_credential() {
    let fx = Fixture::new();
    let manager = fx.manager().await;

    assert_eq!(manager.phase().await, CredentialPhase::Empty);
    assert!(!manager.status().await.valid);
    assert_eq!(fx.endpoint.call_count(), 0);
}

#[tokio::test]
async fn repeated_calls_within_window_fetch_once() {
    let fx = Fixture::new();
    let manager = fx.manager().await;

    let first = manager.get_valid_credential().await.unwrap();
    fx.clock.advance(TimeDelta::minutes(30));
    let second = manager.get_valid_credential().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.endpoint.call_count(), 1);
    assert_eq!(fx.store.save_count(), 1);
}

#[tokio::test]
async fn expiry_uses_window_minus_buffer() {
    let fx = Fixture::new();
    let manager = fx.manager().await;
    let issued = fx.clock.now();

    let credential = manager.get_valid_credential().await.unwrap();
    assert_eq!(credential.issued_at, issued);
    assert_eq!(credential.expires_at, issued + TimeDelta::minutes(115));
    assert_eq!(fx.store.stored().await, Some(credential));
}

#[tokio::test]
async fn call_after_expiry_fetches_exactly_once() {
    let fx = Fixture::new();
    let manager = fx.manager().await;
    manager.get_valid_credential().await.unwrap();

    fx.clock.advance(TimeDelta::minutes(115));
    assert_eq!(manager.phase().await, CredentialPhase::Expired);

    let refreshed = manager.get_valid_credential().await.unwrap();
    assert_eq!(refreshed.token, "TGT-mock-2");
    assert_eq!(fx.endpoint.call_count(), 2);
    assert_eq!(manager.phase().await, CredentialPhase::Valid);
}

#[tokio::test]
async fn valid_persisted_credential_is_adopted_without_network() {
    let fx = Fixture::new();
    let now = fx.clock.now();
    fx.store
        .save(&Credential {
            token: "TGT-from-last-run".into(),
            issued_at: now - TimeDelta::minutes(10),
            expires_at: now + TimeDelta::minutes(105),
        })
        .await
        .unwrap();

    let manager = fx.manager().await;
    assert_eq!(manager.phase().await, CredentialPhase::Valid);
    let credential = manager.get_valid_credential().await.unwrap();
    assert_eq!(credential.token, "TGT-from-last-run");
    assert_eq!(fx.endpoint.call_count(), 0);
}

#[tokio::test]
async fn expired_persisted_credential_is_replaced_on_use() {
    let fx = Fixture::new();
    let now = fx.clock.now();
    fx.store
        .save(&Credential {
            token: "TGT-stale".into(),
            issued_at: now - TimeDelta::hours(3),
            expires_at: now - TimeDelta::hours(1),
        })
        .await
        .unwrap();

    let manager = fx.manager().await;
    assert_eq!(manager.phase().await, CredentialPhase::Expired);
    let credential = manager.get_valid_credential().await.unwrap();
    assert_eq!(credential.token, "TGT-mock-1");
    assert_eq!(fx.store.stored().await.map(|c| c.token), Some("TGT-mock-1".into()));
}

#[tokio::test]
async fn fetch_failure_leaves_state_unchanged() {
    let fx = Fixture::new();
    fx.endpoint.push_failure("invalid credentials").await;
    let manager = fx.manager().await;

    let err = manager.get_valid_credential().await.unwrap_err();
    assert!(matches!(err, GridsyncError::Auth { .. }));
    assert_eq!(manager.phase().await, CredentialPhase::Empty);
    assert_eq!(fx.endpoint.call_count(), 1);
    assert_eq!(fx.store.save_count(), 0);
}

#[tokio::test]
async fn invalidate_clears_memory_and_persistence() {
    let fx = Fixture::new();
    let manager = fx.manager().await;
    manager.get_valid_credential().await.unwrap();

    manager.invalidate().await;

    assert_eq!(manager.phase().await, CredentialPhase::Empty);
    assert!(fx.store.stored().await.is_none());
    manager.get_valid_credential().await.unwrap();
    assert_eq!(fx.endpoint.call_count(), 2);
}

#[tokio::test]
async fn invalidate_swallows_store_failures() {
    let fx = Fixture::new();
    let manager = fx.manager().await;
    manager.get_valid_credential().await.unwrap();
    fx.store.set_fail_saves(true);

    manager.invalidate().await;
    assert_eq!(manager.phase().await, CredentialPhase::Empty);
}

#[tokio::test]
async fn status_reports_preview_and_remaining_time() {
    let fx = Fixture::new();
    fx.endpoint
        .push_ticket("TGT-123456789012345678901234567890")
        .await;
    let manager = fx.manager().await;
    manager.get_valid_credential().await.unwrap();
    fx.clock.advance(TimeDelta::minutes(15));

    let status = manager.status().await;
    assert!(status.valid);
    assert_eq!(status.time_remaining, Some(TimeDelta::minutes(100)));
    assert_eq!(status.token_preview.as_deref(), Some("TGT-1234567890123456..."));

    fx.clock.advance(TimeDelta::minutes(100));
    let status = manager.status().await;
    assert!(!status.valid);
    assert!(status.expires_at.is_none());
    assert_eq!(fx.endpoint.call_count(), 1);
}

#[tokio::test]
async fn credential_survives_restart_through_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gridsync/credential.json");
    let endpoint = MockAuthEndpoint::new();
    let clock = ManualClock::default();

    let first = CredentialManager::open(
        Arc::new(FileCredentialStore::new(&path)),
        Arc::new(endpoint.clone()),
        Arc::new(clock.clone()),
        CredentialPolicy::default(),
    )
    .await;
    let issued = first.get_valid_credential().await.unwrap();
    drop(first);

    clock.advance(TimeDelta::minutes(60));
    let second = CredentialManager::open(
        Arc::new(FileCredentialStore::new(&path)),
        Arc::new(endpoint.clone()),
        Arc::new(clock.clone()),
        CredentialPolicy::default(),
    )
    .await;
    assert_eq!(second.get_valid_credential().await.unwrap(), issued);
    assert_eq!(endpoint.call_count(), 1);
}
