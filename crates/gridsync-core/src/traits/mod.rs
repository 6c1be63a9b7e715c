// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Traits use `#[async_trait]` for dynamic dispatch compatibility, so the
//! credential manager and the upsert engine can hold `Arc<dyn ...>` handles.

pub mod auth;
pub mod clock;
pub mod credential_store;
pub mod record_store;

pub use auth::AuthEndpoint;
pub use clock::{Clock, SystemClock};
pub use credential_store::CredentialStore;
pub use record_store::RecordStore;
