// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request windows for time-ranged endpoints.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};

use gridsync_core::GridsyncError;

/// Rendering used by EPIAS for `startDate` / `endDate`.
const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// An inclusive `[start, end]` range, rendered at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub offset: FixedOffset,
}

impl FetchWindow {
    /// Fails if `end` is before `start`.
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        offset: FixedOffset,
    ) -> Result<Self, GridsyncError> {
        if end < start {
            return Err(GridsyncError::Config(format!(
                "fetch window ends ({end}) before it starts ({start})"
            )));
        }
        Ok(Self { start, end, offset })
    }

    /// 00:00 to 23:00 of the day before `now`, in local time at `offset`.
    pub fn previous_day(now: DateTime<Utc>, offset: FixedOffset) -> Result<Self, GridsyncError> {
        let today = now.with_timezone(&offset).date_naive();
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| GridsyncError::Internal(format!("no day before {today}")))?;

        let at = |hour: u32| -> Result<DateTime<Utc>, GridsyncError> {
            let time = NaiveTime::from_hms_opt(hour, 0, 0)
                .ok_or_else(|| GridsyncError::Internal(format!("invalid hour {hour}")))?;
            yesterday
                .and_time(time)
                .and_local_timezone(offset)
                .single()
                .map(|local| local.with_timezone(&Utc))
                .ok_or_else(|| GridsyncError::Internal(format!("ambiguous local time on {yesterday}")))
        };

        Self::new(at(0)?, at(23)?, offset)
    }

    pub fn start_text(&self) -> String {
        self.start.with_timezone(&self.offset).format(WINDOW_FORMAT).to_string()
    }

    pub fn end_text(&self) -> String {
        self.end.with_timezone(&self.offset).format(WINDOW_FORMAT).to_string()
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset.
///
/// Only the colon form is accepted; chrono validates the digits and range.
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, GridsyncError> {
    let invalid = || GridsyncError::Config(format!("invalid UTC offset `{text}`, expected +HH:MM"));

    if text.len() != 6 || text.as_bytes().get(3) != Some(&b':') {
        return Err(invalid());
    }
    text.parse::<FixedOffset>().map_err(|_| invalid())
}
