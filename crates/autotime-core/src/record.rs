//! Per-day arrival/departure records and their console rendering.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::duration::{signed_difference, split_duration};
use crate::policy::WorkPolicy;

const CLOCK_FORMAT: &str = "%H:%M";
const CLOCK_PLACEHOLDER: &str = "xx:xx";
const HOURS_PLACEHOLDER: &str = "x";
const MINUTES_PLACEHOLDER: &str = "xx";

/// Errors raised when a record cannot be presented.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record has no arrival, so its date cannot be derived.
    #[error("record has no arrival time, its date cannot be derived")]
    MissingArrival,
}

/// Arrival and departure for one calendar day.
///
/// `leave` is filled in retroactively by the following workday's first
/// unlock, using the last lock observed before it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    /// First unlock of the day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrive: Option<NaiveDateTime>,
    /// Last lock before the next workday's first unlock.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leave: Option<NaiveDateTime>,
}

impl DayRecord {
    /// Creates a record for a day that has just started.
    pub const fn arrived(at: NaiveDateTime) -> Self {
        Self {
            arrive: Some(at),
            leave: None,
        }
    }

    /// The calendar date, taken from the arrival.
    pub fn date(&self) -> Option<NaiveDate> {
        self.arrive.map(|arrive| arrive.date())
    }

    /// Worked time with the unpaid break deducted, if the day is closed.
    pub fn worked(&self, policy: &WorkPolicy) -> Option<Duration> {
        let (arrive, leave) = self.arrive.zip(self.leave)?;
        Some(leave - arrive - policy.unpaid_break())
    }

    /// Renders the record as `<date>: <arrive> - <leave> = <h>h <m>m (<dh>h <dm>m)`.
    ///
    /// Missing endpoints render as `xx:xx`, and the worked and delta columns
    /// fall back to `x`/`xx` placeholders.
    pub fn render(&self, policy: &WorkPolicy) -> Result<String, RecordError> {
        let date = self.date().ok_or(RecordError::MissingArrival)?;
        let arrive = clock(self.arrive);
        let leave = clock(self.leave);

        let (worked_hours, worked_minutes, delta_hours, delta_minutes) =
            match self.worked(policy) {
                Some(worked) => {
                    let (hours, minutes) = split_duration(worked);
                    let (delta_hours, delta_minutes) = signed_difference(worked, policy.target());
                    (
                        hours.to_string(),
                        minutes.to_string(),
                        delta_hours.to_string(),
                        delta_minutes.to_string(),
                    )
                }
                None => (
                    HOURS_PLACEHOLDER.to_string(),
                    MINUTES_PLACEHOLDER.to_string(),
                    MINUTES_PLACEHOLDER.to_string(),
                    MINUTES_PLACEHOLDER.to_string(),
                ),
            };

        Ok(format!(
            "{date}: {arrive} - {leave} = {worked_hours}h {worked_minutes}m ({delta_hours}h {delta_minutes}m)"
        ))
    }
}

fn clock(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map_or_else(
        || CLOCK_PLACEHOLDER.to_string(),
        |t| t.format(CLOCK_FORMAT).to_string(),
    )
}
