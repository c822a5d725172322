//! Ties the lock interpreter to its snapshot and the console.

use std::io::{self, Write};

use anyhow::{Context, Result};
use autotime_core::{
    DailyLog, DayRecord, LockInterpreter, Reconciliation, SessionState, WorkPolicy,
};
use autotime_store::{LogStore, StoreError, StoreLock};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Printed before the lines of each first-unlock reconciliation.
pub const RECONCILIATION_SEPARATOR: &str = "-----";

/// Errors from handling one session transition.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The log changed but could not be saved. It is still held in memory.
    #[error("failed to persist daily log")]
    Persist(#[source] StoreError),
    /// Printing the changed days failed. The log was already saved.
    #[error("failed to write day record")]
    Output(#[source] io::Error),
}

/// Counters for one tracking run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub events: usize,
    pub arrivals: usize,
    pub failed_saves: usize,
}

impl Tally {
    /// Accounts for one handled transition.
    ///
    /// A failed save is logged and counted so tracking can go on with the
    /// in-memory log. Output failures are returned.
    pub fn record(&mut self, result: Result<Reconciliation, TrackError>) -> Result<(), TrackError> {
        self.events += 1;
        match result {
            Ok(outcome) => {
                if outcome.is_changed() {
                    self.arrivals += 1;
                }
                Ok(())
            }
            Err(TrackError::Persist(err)) => {
                self.arrivals += 1;
                self.failed_saves += 1;
                tracing::error!(error = %err, "failed to persist daily log, changes kept in memory only");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// A running tracker: interpreter state plus exclusive access to its store.
#[derive(Debug)]
pub struct Tracker {
    interpreter: LockInterpreter,
    store: LogStore,
    _lock: StoreLock,
}

impl Tracker {
    /// Locks the store and loads its log.
    ///
    /// An empty or corrupt snapshot starts a fresh log.
    pub fn open(store: LogStore, policy: WorkPolicy) -> Result<Self> {
        let lock = store
            .lock()
            .with_context(|| format!("failed to lock {}", store.path().display()))?;
        let log = store
            .load_or_empty()
            .with_context(|| format!("failed to load {}", store.path().display()))?;
        tracing::info!(path = %store.path().display(), days = log.len(), "daily log ready");

        Ok(Self {
            interpreter: LockInterpreter::new(log, policy),
            store,
            _lock: lock,
        })
    }

    pub const fn log(&self) -> &DailyLog {
        self.interpreter.log()
    }

    /// Prints every recorded day in ascending order.
    pub fn print_log<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        write_log(writer, self.log(), self.interpreter.policy())
    }

    /// Feeds one session transition observed at `now`.
    ///
    /// On a first unlock of the day the log is saved, then the changed days
    /// are printed. The save is attempted even if printing will fail, so an
    /// arrival is never lost to a broken console.
    pub fn handle<W: Write>(
        &mut self,
        state: SessionState,
        now: NaiveDateTime,
        writer: &mut W,
    ) -> Result<Reconciliation, TrackError> {
        let outcome = self.interpreter.handle(state, now);
        if !outcome.is_changed() {
            return Ok(outcome);
        }

        let saved = self.store.save(self.log());
        self.print_changes(writer, &outcome)
            .map_err(TrackError::Output)?;
        saved.map_err(TrackError::Persist)?;
        Ok(outcome)
    }

    fn print_changes<W: Write>(&self, writer: &mut W, outcome: &Reconciliation) -> io::Result<()> {
        writeln!(writer, "{RECONCILIATION_SEPARATOR}")?;
        for date in outcome.changed_dates() {
            if let Some(record) = self.log().get(date) {
                write_record(writer, date, record, self.interpreter.policy())?;
            }
        }
        Ok(())
    }
}

/// Writes one line per recorded day.
pub fn write_log<W: Write>(writer: &mut W, log: &DailyLog, policy: &WorkPolicy) -> io::Result<()> {
    for (date, record) in log.iter() {
        write_record(writer, date, record, policy)?;
    }
    Ok(())
}

fn write_record<W: Write>(
    writer: &mut W,
    date: NaiveDate,
    record: &DayRecord,
    policy: &WorkPolicy,
) -> io::Result<()> {
    match record.render(policy) {
        Ok(line) => writeln!(writer, "{line}")?,
        Err(err) => tracing::warn!(%date, error = %err, "skipping day record"),
    }
    Ok(())
}
