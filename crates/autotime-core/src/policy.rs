//! Workday accounting parameters.

use chrono::Duration;

/// Default unpaid break deducted from every closed day.
pub const DEFAULT_UNPAID_BREAK_MINUTES: u32 = 30;

/// Default expected working time per day.
pub const DEFAULT_TARGET_WORK_HOURS: u32 = 8;

/// Default number of days searched backwards for the previous workday.
pub const DEFAULT_MAX_BACKSCAN_DAYS: u32 = 100;

/// Parameters that turn arrival/departure pairs into worked time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkPolicy {
    /// Minutes deducted from each closed day.
    pub unpaid_break_minutes: u32,
    /// Expected hours per day, compared against worked time.
    pub target_work_hours: u32,
    /// How far back to look for the previous workday.
    pub max_backscan_days: u32,
}

impl Default for WorkPolicy {
    fn default() -> Self {
        Self {
            unpaid_break_minutes: DEFAULT_UNPAID_BREAK_MINUTES,
            target_work_hours: DEFAULT_TARGET_WORK_HOURS,
            max_backscan_days: DEFAULT_MAX_BACKSCAN_DAYS,
        }
    }
}

impl WorkPolicy {
    pub fn unpaid_break(&self) -> Duration {
        Duration::minutes(i64::from(self.unpaid_break_minutes))
    }

    pub fn target(&self) -> Duration {
        Duration::hours(i64::from(self.target_work_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_workday() {
        let policy = WorkPolicy::default();
        assert_eq!(policy.unpaid_break(), Duration::minutes(30));
        assert_eq!(policy.target(), Duration::hours(8));
        assert_eq!(policy.max_backscan_days, 100);
    }
}
