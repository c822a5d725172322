//! Turns lock/unlock transitions into arrivals and departures.
//!
//! The only signal available is the lock state of the desktop session:
//!
//! - The first unlock of a calendar day is that day's arrival.
//! - The last lock before it is the departure of the previous workday,
//!   even when that lock happened after midnight.
//! - Any further unlock on the same day changes nothing.
//!
//! Lock and unlock timestamps live only as long as the interpreter does.
//! After a restart the previous workday stays open until a lock has been
//! observed again.

use chrono::{NaiveDate, NaiveDateTime};

use crate::daily_log::DailyLog;
use crate::policy::WorkPolicy;
use crate::session::SessionState;

/// Outcome of feeding one transition to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Locks and repeated unlocks leave the log untouched.
    Unchanged,
    /// The first unlock of `arrived` was recorded, optionally closing the
    /// previous workday.
    Arrived {
        closed: Option<NaiveDate>,
        arrived: NaiveDate,
    },
}

impl Reconciliation {
    /// Whether the log changed and must be persisted.
    pub const fn is_changed(&self) -> bool {
        matches!(self, Self::Arrived { .. })
    }

    /// Dates whose records changed, previous workday first.
    pub fn changed_dates(&self) -> Vec<NaiveDate> {
        match *self {
            Self::Unchanged => Vec::new(),
            Self::Arrived { closed, arrived } => closed.into_iter().chain([arrived]).collect(),
        }
    }
}

/// Daily log state machine driven by session lock transitions.
#[derive(Debug, Clone)]
pub struct LockInterpreter {
    log: DailyLog,
    policy: WorkPolicy,
    latest_lock: Option<NaiveDateTime>,
    latest_unlock: Option<NaiveDateTime>,
}

impl LockInterpreter {
    pub const fn new(log: DailyLog, policy: WorkPolicy) -> Self {
        Self {
            log,
            policy,
            latest_lock: None,
            latest_unlock: None,
        }
    }

    pub const fn log(&self) -> &DailyLog {
        &self.log
    }

    pub const fn policy(&self) -> &WorkPolicy {
        &self.policy
    }

    pub const fn latest_lock(&self) -> Option<NaiveDateTime> {
        self.latest_lock
    }

    pub const fn latest_unlock(&self) -> Option<NaiveDateTime> {
        self.latest_unlock
    }

    /// Callback for a screensaver `ActiveChanged` notification received at `now`.
    pub fn on_session_state_change(&mut self, is_locked: bool, now: NaiveDateTime) -> Reconciliation {
        self.handle(SessionState::from_locked(is_locked), now)
    }

    pub fn handle(&mut self, state: SessionState, now: NaiveDateTime) -> Reconciliation {
        match state {
            SessionState::Locked => {
                tracing::debug!(%now, "session locked");
                self.latest_lock = Some(now);
                Reconciliation::Unchanged
            }
            SessionState::Unlocked => {
                tracing::debug!(%now, "session unlocked");
                self.latest_unlock = Some(now);
                self.reconcile(now)
            }
        }
    }

    fn reconcile(&mut self, unlocked_at: NaiveDateTime) -> Reconciliation {
        let today = unlocked_at.date();
        if self.log.get_or_create(today).arrive.is_some() {
            return Reconciliation::Unchanged;
        }

        let closed = self.close_previous_workday(today);
        self.log.get_or_create(today).arrive = Some(unlocked_at);
        tracing::info!(%today, arrive = %unlocked_at, "recorded arrival");

        Reconciliation::Arrived {
            closed,
            arrived: today,
        }
    }

    fn close_previous_workday(&mut self, today: NaiveDate) -> Option<NaiveDate> {
        let max_backscan_days = self.policy.max_backscan_days;
        let Some((date, record)) = self
            .log
            .most_recent_prior_workday_mut(today, max_backscan_days)
        else {
            tracing::info!(max_backscan_days, "no workday within backscan window, nothing to close");
            return None;
        };

        let Some(leave) = self.latest_lock else {
            tracing::warn!(%date, "no lock observed since startup, leaving previous workday open");
            return None;
        };

        record.leave = Some(leave);
        tracing::info!(%date, %leave, "recorded departure");
        Some(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::record::DayRecord;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn interpreter() -> LockInterpreter {
        LockInterpreter::new(DailyLog::new(), WorkPolicy::default())
    }

    #[test]
    fn lock_only_updates_latest_lock() {
        let mut interp = interpreter();
        let outcome = interp.on_session_state_change(true, ts("2024-01-01T12:00"));

        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(interp.latest_lock(), Some(ts("2024-01-01T12:00")));
        assert!(interp.log().is_empty());
    }

    #[test]
    fn first_unlock_records_arrival() {
        let mut interp = interpreter();
        let outcome = interp.on_session_state_change(false, ts("2024-01-01T08:00"));

        assert_eq!(
            outcome,
            Reconciliation::Arrived {
                closed: None,
                arrived: date("2024-01-01"),
            }
        );
        assert_eq!(
            interp.log().get(date("2024-01-01")),
            Some(&DayRecord::arrived(ts("2024-01-01T08:00")))
        );
        assert_eq!(interp.latest_unlock(), Some(ts("2024-01-01T08:00")));
    }

    #[test]
    fn later_unlocks_same_day_are_no_ops() {
        let mut interp = interpreter();
        interp.on_session_state_change(false, ts("2024-01-01T08:00"));
        interp.on_session_state_change(true, ts("2024-01-01T12:00"));
        let outcome = interp.on_session_state_change(false, ts("2024-01-01T12:45"));

        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(
            interp.log().get(date("2024-01-01")).unwrap().arrive,
            Some(ts("2024-01-01T08:00"))
        );
        assert_eq!(interp.latest_unlock(), Some(ts("2024-01-01T12:45")));
    }

    #[test]
    fn next_day_unlock_closes_previous_day_with_last_lock() {
        let mut interp = interpreter();
        interp.on_session_state_change(false, ts("2024-01-01T08:00"));
        interp.on_session_state_change(true, ts("2024-01-01T17:30"));
        let outcome = interp.on_session_state_change(false, ts("2024-01-02T09:00"));

        assert_eq!(
            outcome,
            Reconciliation::Arrived {
                closed: Some(date("2024-01-01")),
                arrived: date("2024-01-02"),
            }
        );
        assert_eq!(
            interp.log().get(date("2024-01-01")).unwrap().leave,
            Some(ts("2024-01-01T17:30"))
        );
        assert_eq!(
            interp.log().get(date("2024-01-02")),
            Some(&DayRecord::arrived(ts("2024-01-02T09:00")))
        );
    }

    #[test]
    fn lock_after_midnight_becomes_departure() {
        let mut interp = interpreter();
        interp.on_session_state_change(false, ts("2024-01-01T14:00"));
        interp.on_session_state_change(true, ts("2024-01-02T01:15"));
        interp.on_session_state_change(false, ts("2024-01-02T10:00"));

        assert_eq!(
            interp.log().get(date("2024-01-01")).unwrap().leave,
            Some(ts("2024-01-02T01:15"))
        );
    }

    #[test]
    fn closes_workday_across_weekend() {
        let mut interp = interpreter();
        interp.on_session_state_change(false, ts("2024-01-05T08:00"));
        interp.on_session_state_change(true, ts("2024-01-05T16:00"));
        let outcome = interp.on_session_state_change(false, ts("2024-01-08T08:30"));

        assert_eq!(outcome.changed_dates(), [date("2024-01-05"), date("2024-01-08")]);
    }

    #[test]
    fn unlock_without_observed_lock_leaves_previous_day_open() {
        let mut log = DailyLog::new();
        log.insert(date("2024-01-01"), DayRecord::arrived(ts("2024-01-01T08:00")));
        let mut interp = LockInterpreter::new(log, WorkPolicy::default());

        let outcome = interp.on_session_state_change(false, ts("2024-01-02T08:00"));

        assert_eq!(
            outcome,
            Reconciliation::Arrived {
                closed: None,
                arrived: date("2024-01-02"),
            }
        );
        assert!(interp.log().get(date("2024-01-01")).unwrap().leave.is_none());
    }

    #[test]
    fn prior_day_outside_backscan_window_is_not_closed() {
        let mut log = DailyLog::new();
        log.insert(date("2024-01-01"), DayRecord::arrived(ts("2024-01-01T08:00")));
        let policy = WorkPolicy {
            max_backscan_days: 3,
            ..WorkPolicy::default()
        };
        let mut interp = LockInterpreter::new(log, policy);

        interp.on_session_state_change(true, ts("2024-01-01T17:00"));
        let outcome = interp.on_session_state_change(false, ts("2024-01-05T08:00"));

        assert_eq!(outcome.changed_dates(), [date("2024-01-05")]);
        assert!(interp.log().get(date("2024-01-01")).unwrap().leave.is_none());
    }

    #[test]
    fn end_to_end_workday_rendering() {
        let mut interp = interpreter();
        interp.on_session_state_change(false, ts("2024-01-01T08:00"));
        let policy = *interp.policy();
        let day_one = interp.log().get(date("2024-01-01")).unwrap().clone();
        assert!(day_one.render(&policy).unwrap().ends_with("= xh xxm (xxh xxm)"));

        interp.on_session_state_change(true, ts("2024-01-01T16:30"));
        interp.on_session_state_change(false, ts("2024-01-02T08:15"));

        let day_one = interp.log().get(date("2024-01-01")).unwrap();
        assert_eq!(
            day_one.render(&policy).unwrap(),
            "2024-01-01: 08:00 - 16:30 = 8h 0m (0h 0m)"
        );
        let day_two = interp.log().get(date("2024-01-02")).unwrap();
        assert_eq!(
            day_two.render(&policy).unwrap(),
            "2024-01-02: 08:15 - xx:xx = xh xxm (xxh xxm)"
        );
    }
}
