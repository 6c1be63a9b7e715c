// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file persistence for the current credential.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use gridsync_core::{Credential, CredentialStore, GridsyncError};

/// Persists one credential as pretty-printed JSON.
///
/// The parent directory is created on first save. Saves go through a
/// sibling `.tmp` file that is renamed over the target; on Unix that file is
/// created owner-only, so the token is never readable by others.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Write `contents` to a fresh temp file opened with mode 0600.
    async fn write_restricted(&self, temp: &Path, contents: &[u8]) -> std::io::Result<()> {
        // A leftover temp file would keep its old mode.
        match tokio::fs::remove_file(temp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(temp).await?;
        file.write_all(contents).await?;
        file.sync_all().await
    }
}

fn cache_error(
    message: String,
    source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> GridsyncError {
    GridsyncError::CredentialCache {
        message,
        source: Some(source.into()),
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>, GridsyncError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(cache_error(
                    format!("failed to read {}", self.path.display()),
                    e,
                ));
            }
        };

        let credential = serde_json::from_str(&content)
            .map_err(|e| cache_error(format!("invalid JSON in {}", self.path.display()), e))?;
        Ok(Some(credential))
    }

    async fn save(&self, credential: &Credential) -> Result<(), GridsyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                cache_error(format!("failed to create {}", parent.display()), e)
            })?;
        }

        let json = serde_json::to_string_pretty(credential)
            .map_err(|e| cache_error("failed to serialize credential".to_string(), e))?;
        let temp = self.temp_path();
        self.write_restricted(&temp, json.as_bytes())
            .await
            .map_err(|e| cache_error(format!("failed to write {}", temp.display()), e))?;
        tokio::fs::rename(&temp, &self.path)
            .await
            .map_err(|e| cache_error(format!("failed to replace {}", self.path.display()), e))?;

        debug!(path = %self.path.display(), "credential persisted");
        Ok(())
    }

    async fn clear(&self) -> Result<(), GridsyncError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(cache_error(
                format!("failed to delete {}", self.path.display()),
                e,
            )),
        }
    }
}
