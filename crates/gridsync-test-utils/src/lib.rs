// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for gridsync integration tests.
//!
//! Provides in-memory adapters for every core trait so credential and upsert
//! behavior can be tested deterministically without network or disk.
//!
//! # Components
//!
//! - [`MockAuthEndpoint`] - Scripted ticket responses with a call counter
//! - [`InMemoryCredentialStore`] - Credential persistence held in memory
//! - [`MemoryRecordStore`] - Record store with an availability switch
//! - [`ManualClock`] - Clock advanced explicitly by the test

pub mod clock;
pub mod credential_store;
pub mod mock_auth;
pub mod record_store;

pub use clock::ManualClock;
pub use credential_store::InMemoryCredentialStore;
pub use mock_auth::MockAuthEndpoint;
pub use record_store::MemoryRecordStore;
