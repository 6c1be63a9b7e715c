// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication endpoint trait.

use async_trait::async_trait;

use crate::error::GridsyncError;

/// Issues session tickets in exchange for the configured shared secret.
///
/// There is no refresh-token mechanism: every call re-authenticates with the
/// same secret identity.
#[async_trait]
pub trait AuthEndpoint: Send + Sync {
    /// Performs exactly one authentication request and returns the raw ticket.
    ///
    /// Failures are reported as [`GridsyncError::Auth`]; implementations must
    /// not retry internally.
    async fn request_ticket(&self) -> Result<String, GridsyncError>;
}
