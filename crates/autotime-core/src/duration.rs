//! Hour/minute arithmetic on durations.

use chrono::Duration;

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Splits a duration into whole hours and whole minutes.
///
/// Leftover seconds are truncated, never rounded up. A negative duration is
/// split by magnitude and both components are negated, so the two parts
/// always share a sign.
pub fn split_duration(duration: Duration) -> (i64, i64) {
    let seconds = duration.num_seconds();
    let magnitude = seconds.abs();
    let hours = magnitude / SECONDS_PER_HOUR;
    let minutes = (magnitude % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;

    if seconds < 0 {
        (-hours, -minutes)
    } else {
        (hours, minutes)
    }
}

/// Computes `a - b` as an (hours, minutes) pair.
///
/// A deficit is reported with both components negated: 1h30m short of the
/// target is `(-1, -30)`, not `(-1, 30)`.
pub fn signed_difference(a: Duration, b: Duration) -> (i64, i64) {
    if a >= b {
        split_duration(a - b)
    } else {
        let (hours, minutes) = split_duration(b - a);
        (-hours, -minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_truncates_minutes() {
        let d = Duration::hours(7) + Duration::minutes(29) + Duration::seconds(59);
        assert_eq!(split_duration(d), (7, 29));
    }

    #[test]
    fn split_zero() {
        assert_eq!(split_duration(Duration::zero()), (0, 0));
    }

    #[test]
    fn split_never_rounds_up() {
        // Every second across two hours, checked against the total minute count.
        for seconds in 0..(2 * SECONDS_PER_HOUR) {
            let d = Duration::seconds(seconds);
            let (hours, minutes) = split_duration(d);
            let total = hours * 60 + minutes;
            assert!(total <= d.num_minutes(), "rounded up at {seconds}s");
            assert!(d.num_minutes() < total + 1, "dropped a minute at {seconds}s");
            assert!((0..60).contains(&minutes));
        }
    }

    #[test]
    fn split_keeps_hours_past_a_day() {
        assert_eq!(split_duration(Duration::hours(26) + Duration::minutes(5)), (26, 5));
    }

    #[test]
    fn split_negative_has_uniform_sign() {
        assert_eq!(split_duration(Duration::minutes(-20)), (0, -20));
        assert_eq!(split_duration(Duration::minutes(-90)), (-1, -30));
    }

    #[test]
    fn difference_surplus() {
        assert_eq!(signed_difference(Duration::hours(9), Duration::hours(8)), (1, 0));
    }

    #[test]
    fn difference_deficit_negates_both_components() {
        let worked = Duration::hours(7) + Duration::minutes(30);
        assert_eq!(signed_difference(worked, Duration::hours(8)), (0, -30));

        let worked = Duration::hours(6) + Duration::minutes(30);
        assert_eq!(signed_difference(worked, Duration::hours(8)), (-1, -30));
    }

    #[test]
    fn difference_equal_is_zero() {
        let d = Duration::hours(8);
        assert_eq!(signed_difference(d, d), (0, 0));
    }
}
