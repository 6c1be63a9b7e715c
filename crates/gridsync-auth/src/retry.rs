// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recovery from a data endpoint rejecting a locally valid credential.

use std::future::Future;

use tracing::warn;

use gridsync_core::{Credential, GridsyncError};

use crate::manager::CredentialManager;

/// Run `call` with a valid credential, retrying once after a rejection.
///
/// If the first attempt fails with [`GridsyncError::CredentialRejected`], the
/// credential is invalidated, a fresh one is fetched, and `call` runs exactly
/// once more. Whatever the second attempt returns is final. Any other error
/// from the first attempt is returned without a retry.
pub async fn with_credential_retry<T, F, Fut>(
    manager: &CredentialManager,
    mut call: F,
) -> Result<T, GridsyncError>
where
    F: FnMut(Credential) -> Fut,
    Fut: Future<Output = Result<T, GridsyncError>>,
{
    let credential = manager.get_valid_credential().await?;
    match call(credential).await {
        Err(e) if e.is_credential_rejection() => {
            warn!(error = %e, "credential rejected, refreshing and retrying once");
            manager.invalidate().await;
            let fresh = manager.get_valid_credential().await?;
            call(fresh).await
        }
        other => other,
    }
}
