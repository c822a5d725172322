//! Day records keyed by calendar date.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::DayRecord;

/// Every recorded workday, ordered by date.
///
/// Records are created on first reference and never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyLog {
    days: BTreeMap<NaiveDate, DayRecord>,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&date)
    }

    /// Returns the record for `date`, inserting an empty one if absent.
    pub fn get_or_create(&mut self, date: NaiveDate) -> &mut DayRecord {
        self.days.entry(date).or_default()
    }

    /// Replaces the record for `date`.
    pub fn insert(&mut self, date: NaiveDate, record: DayRecord) -> Option<DayRecord> {
        self.days.insert(date, record)
    }

    /// Finds the latest recorded day strictly before `today`, looking back
    /// at most `max_backscan_days` days.
    pub fn most_recent_prior_workday(
        &self,
        today: NaiveDate,
        max_backscan_days: u32,
    ) -> Option<(NaiveDate, &DayRecord)> {
        let earliest = backscan_start(today, max_backscan_days);
        self.days
            .range(earliest..today)
            .next_back()
            .map(|(date, record)| (*date, record))
    }

    /// Mutable variant of [`most_recent_prior_workday`](Self::most_recent_prior_workday).
    pub fn most_recent_prior_workday_mut(
        &mut self,
        today: NaiveDate,
        max_backscan_days: u32,
    ) -> Option<(NaiveDate, &mut DayRecord)> {
        let earliest = backscan_start(today, max_backscan_days);
        self.days
            .range_mut(earliest..today)
            .next_back()
            .map(|(date, record)| (*date, record))
    }

    /// Iterates over all records in ascending date order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &DayRecord)> {
        self.days.iter().map(|(date, record)| (*date, record))
    }
}

impl FromIterator<(NaiveDate, DayRecord)> for DailyLog {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, DayRecord)>>(iter: I) -> Self {
        Self {
            days: iter.into_iter().collect(),
        }
    }
}

/// First date inside the backscan window, clamped to the calendar's start.
fn backscan_start(today: NaiveDate, max_backscan_days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(max_backscan_days)))
        .unwrap_or(NaiveDate::MIN)
}
