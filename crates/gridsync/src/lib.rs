// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run orchestration for the `gridsync` binary.
//!
//! [`bootstrap`] wires the production adapters from configuration,
//! [`pipeline`] performs one fetch-normalize-upsert pass per source, and
//! [`schedule`] repeats that pass on a cron expression. [`history`] reads
//! the stored collections back.

pub mod bootstrap;
pub mod history;
pub mod pipeline;
pub mod schedule;
pub mod shutdown;

pub use pipeline::{Pipeline, RunSummary, SourceKind};
