// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent upserts for normalized record batches.
//!
//! For every record the engine performs exactly one of insert, full
//! replacement, or nothing, decided by comparing the incoming record with the
//! stored one under a fixed normalization. Applying the same batch twice
//! issues no writes the second time.

pub mod collection;
pub mod engine;
pub mod identity;
pub mod normalize;

pub use collection::Collection;
pub use engine::{UpsertEngine, apply};
pub use identity::identity_of;
pub use normalize::{data_equal, normalize_record};
