// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cron-driven repetition of pipeline runs.
//!
//! A failed run is logged and the loop waits for the next occurrence; this is
//! the only place where work is retried across runs.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use croner::Cron;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use gridsync_config::model::ScheduleConfig;
use gridsync_core::GridsyncError;

use crate::pipeline::{Pipeline, SourceKind};

/// Parse a cron expression, evaluated in UTC.
pub fn parse_cron(expression: &str) -> Result<Cron, GridsyncError> {
    Cron::from_str(expression)
        .map_err(|e| GridsyncError::Config(format!("invalid cron expression `{expression}`: {e}")))
}

/// First occurrence strictly after `after`.
pub fn next_occurrence(cron: &Cron, after: &DateTime<Utc>) -> Result<DateTime<Utc>, GridsyncError> {
    cron.find_next_occurrence(after, false)
        .map_err(|e| GridsyncError::Internal(format!("no next cron occurrence after {after}: {e}")))
}

/// Run every source once and log the outcome.
pub async fn run_once(pipeline: &Pipeline) -> bool {
    let summary = pipeline.run(&SourceKind::all(), None).await;
    for report in &summary.reports {
        info!(
            collection = %report.collection,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            "scheduled sync finished"
        );
    }
    if !summary.is_success() {
        warn!(failed = summary.failures.len(), "scheduled run had failures, waiting for next occurrence");
    }
    summary.is_success()
}

/// Run the pipeline on `schedule.cron` until `cancel` fires.
///
/// An in-flight run is allowed to finish before the loop exits.
pub async fn run_schedule(
    pipeline: &Pipeline,
    schedule: &ScheduleConfig,
    cancel: CancellationToken,
) -> Result<(), GridsyncError> {
    let cron = parse_cron(&schedule.cron)?;
    info!(cron = %schedule.cron, "scheduler started");

    if schedule.run_on_start {
        run_once(pipeline).await;
    }

    loop {
        let now = Utc::now();
        let next = next_occurrence(&cron, &now)?;
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        info!(next_run = %next, "waiting for next occurrence");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("scheduler stopping");
                return Ok(());
            }
            _ = tokio::time::sleep(wait) => {}
        }

        run_once(pipeline).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_expression_fires_at_minute_five() {
        let cron = parse_cron("5 * * * *").unwrap();
        let after = Utc.with_ymd_and_hms(2025, 1, 1, 10, 5, 0).unwrap();
        let next = next_occurrence(&cron, &after).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 11, 5, 0).unwrap());

        let before = Utc.with_ymd_and_hms(2025, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(
            next_occurrence(&cron, &before).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 10, 5, 0).unwrap()
        );
    }

    #[test]
    fn invalid_expression_is_a_config_error() {
        assert!(matches!(parse_cron("every hour"), Err(GridsyncError::Config(_))));
    }
}
