// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session ticket lifecycle for gridsync.
//!
//! [`CredentialManager`] hands out a valid ticket, fetching a new one from an
//! [`AuthEndpoint`](gridsync_core::AuthEndpoint) only when the cached one is
//! missing or past its local expiry. [`with_credential_retry`] recovers from a
//! data endpoint rejecting a ticket that still looked valid locally.

pub mod cas;
pub mod file_store;
pub mod manager;
pub mod retry;

pub use cas::CasTicketClient;
pub use file_store::FileCredentialStore;
pub use manager::{CredentialManager, CredentialPolicy};
pub use retry::with_credential_retry;
