// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upstream data sources for gridsync.
//!
//! Each source has an HTTP client that returns the raw JSON payload and a
//! pure normalizer that turns the payload into flat [`Record`](gridsync_core::Record)s
//! for a fixed [`Collection`](gridsync_upsert::Collection).

pub mod emaps;
pub mod epias;
pub mod window;

pub use emaps::{
    EmapsClient, carbon_collection, normalize_carbon_intensity, normalize_power_breakdown,
    power_collection,
};
pub use epias::{EpiasConsumptionClient, consumption_collection, normalize_consumption};
pub use window::{FetchWindow, parse_utc_offset};
