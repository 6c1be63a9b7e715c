// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the production adapters from configuration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::debug;

use gridsync_auth::{CasTicketClient, CredentialManager, CredentialPolicy, FileCredentialStore};
use gridsync_config::GridsyncConfig;
use gridsync_core::{AuthEndpoint, GridsyncError, SystemClock};
use gridsync_sources::{EmapsClient, EpiasConsumptionClient, parse_utc_offset};
use gridsync_storage::SqliteRecordStore;

use crate::pipeline::Pipeline;

/// Stands in for the CAS client when no account is configured, so commands
/// that never need a ticket still work.
#[derive(Debug)]
struct MissingAccount;

#[async_trait]
impl AuthEndpoint for MissingAccount {
    async fn request_ticket(&self) -> Result<String, GridsyncError> {
        Err(GridsyncError::Config(
            "auth.username and auth.password must be set to request a ticket".into(),
        ))
    }
}

fn auth_endpoint(config: &GridsyncConfig) -> Result<Arc<dyn AuthEndpoint>, GridsyncError> {
    let auth = &config.auth;
    match (&auth.username, &auth.password) {
        (Some(username), Some(password)) => Ok(Arc::new(CasTicketClient::new(
            auth.cas_url.clone(),
            username.clone(),
            SecretString::from(password.clone()),
            Duration::from_secs(auth.request_timeout_secs),
        )?)),
        _ => {
            debug!("no CAS account configured");
            Ok(Arc::new(MissingAccount))
        }
    }
}

/// Credential manager backed by the configured cache file and CAS endpoint.
pub async fn open_credentials(
    config: &GridsyncConfig,
) -> Result<Arc<CredentialManager>, GridsyncError> {
    let auth = &config.auth;
    let manager = CredentialManager::open(
        Arc::new(FileCredentialStore::new(&auth.cache_path)),
        auth_endpoint(config)?,
        Arc::new(SystemClock),
        CredentialPolicy::from_secs(auth.validity_window_secs, auth.safety_buffer_secs),
    )
    .await;
    Ok(Arc::new(manager))
}

/// Open the store and build a [`Pipeline`] over it.
///
/// The store is returned alongside so the caller can close it.
pub async fn open_pipeline(
    config: &GridsyncConfig,
) -> Result<(Pipeline, Arc<SqliteRecordStore>), GridsyncError> {
    let timeout = Duration::from_secs(config.auth.request_timeout_secs);
    let credentials = open_credentials(config).await?;

    let epias = EpiasConsumptionClient::new(
        config.epias.consumption_url.clone(),
        config.epias.region_code.clone(),
        timeout,
    )?;
    let token = config.emaps.auth_token.clone().map(SecretString::from);
    let emaps = EmapsClient::new(
        config.emaps.power_breakdown_url.clone(),
        config.emaps.carbon_history_url.clone(),
        token.as_ref(),
        timeout,
    )?;
    let offset = parse_utc_offset(&config.epias.utc_offset)?;

    let store = Arc::new(SqliteRecordStore::open(&config.storage).await?);
    let pipeline = Pipeline::new(
        credentials,
        epias,
        emaps,
        store.clone(),
        Arc::new(SystemClock),
        offset,
    );
    Ok((pipeline, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridsync_core::CredentialPhase;

    fn config_in(dir: &tempfile::TempDir) -> GridsyncConfig {
        let mut config = GridsyncConfig::default();
        config.auth.cache_path = dir.path().join("credential.json").display().to_string();
        config.storage.database_path = dir.path().join("gridsync.db").display().to_string();
        config
    }

    #[tokio::test]
    async fn missing_account_fails_only_when_a_ticket_is_needed() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let manager = open_credentials(&config).await.unwrap();
        assert_eq!(manager.phase().await, CredentialPhase::Empty);
        assert!(!manager.status().await.valid);

        let err = manager.get_valid_credential().await.unwrap_err();
        assert!(matches!(err, GridsyncError::Config(_)), "{err:?}");
    }

    #[tokio::test]
    async fn pipeline_opens_against_a_fresh_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(&dir);

        let (pipeline, store) = open_pipeline(&config).await.unwrap();
        assert!(pipeline.default_window().is_ok());
        assert!(dir.path().join("gridsync.db").exists());
        store.close().await.unwrap();
    }
}
