// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One ingestion run: fetch, normalize, upsert, per source.
//!
//! Sources run one after another and fail independently. A failed source is
//! recorded in the [`RunSummary`] and the remaining sources still run.

use std::fmt;
use std::sync::Arc;

use chrono::FixedOffset;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::{error, info};

use gridsync_auth::CredentialManager;
use gridsync_core::{Clock, GridsyncError, RecordStore, UpsertReport};
use gridsync_sources::{
    EmapsClient, EpiasConsumptionClient, FetchWindow, carbon_collection, consumption_collection,
    normalize_carbon_intensity, normalize_consumption, normalize_power_breakdown,
    power_collection,
};
use gridsync_upsert::UpsertEngine;

/// An upstream dataset and the collection it lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum SourceKind {
    /// EPIAS real-time consumption.
    Epias,
    /// Electricity Maps power breakdown.
    Power,
    /// Electricity Maps carbon intensity.
    Carbon,
}

impl SourceKind {
    pub fn all() -> Vec<SourceKind> {
        SourceKind::iter().collect()
    }
}

/// Outcome of one run across the selected sources.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<UpsertReport>,
    pub failures: Vec<(SourceKind, GridsyncError)>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for report in &self.reports {
            writeln!(f, "{report}")?;
        }
        for (source, error) in &self.failures {
            writeln!(f, "{source}: FAILED: {error}")?;
        }
        Ok(())
    }
}

/// Everything a run needs, already wired.
pub struct Pipeline {
    credentials: Arc<CredentialManager>,
    epias: EpiasConsumptionClient,
    emaps: EmapsClient,
    engine: UpsertEngine,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl Pipeline {
    pub fn new(
        credentials: Arc<CredentialManager>,
        epias: EpiasConsumptionClient,
        emaps: EmapsClient,
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        utc_offset: FixedOffset,
    ) -> Self {
        Self {
            credentials,
            epias,
            emaps,
            engine: UpsertEngine::new(store),
            clock,
            utc_offset,
        }
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    /// Yesterday, 00:00 to 23:00 local time.
    pub fn default_window(&self) -> Result<FetchWindow, GridsyncError> {
        FetchWindow::previous_day(self.clock.now(), self.utc_offset)
    }

    /// Run `sources` in order. `window` applies to EPIAS only and defaults to
    /// [`default_window`](Self::default_window).
    pub async fn run(&self, sources: &[SourceKind], window: Option<FetchWindow>) -> RunSummary {
        let mut summary = RunSummary::default();

        for &source in sources {
            let result = match source {
                SourceKind::Epias => match window.map_or_else(|| self.default_window(), Ok) {
                    Ok(window) => self.sync_consumption(&window).await,
                    Err(e) => Err(e),
                },
                SourceKind::Power => self.sync_power_breakdown().await,
                SourceKind::Carbon => self.sync_carbon_intensity().await,
            };

            match result {
                Ok(report) => summary.reports.push(report),
                Err(e) => {
                    error!(source = %source, error = %e, "source failed");
                    summary.failures.push((source, e));
                }
            }
        }

        info!(
            succeeded = summary.reports.len(),
            failed = summary.failures.len(),
            "run complete"
        );
        summary
    }

    pub async fn sync_consumption(&self, window: &FetchWindow) -> Result<UpsertReport, GridsyncError> {
        info!(start = %window.start_text(), end = %window.end_text(), "syncing EPIAS consumption");
        let payload = self.epias.fetch_with_retry(&self.credentials, window).await?;
        let records = normalize_consumption(&payload)?;
        self.engine.apply(records, &consumption_collection()).await
    }

    pub async fn sync_power_breakdown(&self) -> Result<UpsertReport, GridsyncError> {
        info!("syncing power breakdown");
        let payload = self.emaps.fetch_power_breakdown().await?;
        let records = normalize_power_breakdown(&payload)?;
        self.engine.apply(records, &power_collection()).await
    }

    pub async fn sync_carbon_intensity(&self) -> Result<UpsertReport, GridsyncError> {
        info!("syncing carbon intensity");
        let payload = self.emaps.fetch_carbon_intensity().await?;
        let records = normalize_carbon_intensity(&payload)?;
        self.engine.apply(records, &carbon_collection()).await
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("epias", &self.epias)
            .field("emaps", &self.emaps)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_are_snake_case() {
        assert_eq!(SourceKind::Epias.to_string(), "epias");
        assert_eq!(SourceKind::Carbon.to_string(), "carbon");
        assert_eq!(SourceKind::all().len(), 3);
    }

    #[test]
    fn summary_lists_failures_after_reports() {
        let mut report = UpsertReport::new("power_data");
        report.inserted = 2;
        let summary = RunSummary {
            reports: vec![report],
            failures: vec![(SourceKind::Epias, GridsyncError::Config("no username".into()))],
        };
        let text = summary.to_string();
        assert!(!summary.is_success());
        assert!(text.starts_with("power_data: inserted 2"), "{text}");
        assert!(text.contains("epias: FAILED: configuration error: no username"), "{text}");
    }
}
