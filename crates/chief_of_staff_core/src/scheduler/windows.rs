//! crates/chief_of_staff_core/src/scheduler/windows.rs
//!
//! Pure time-window arithmetic for the notification scheduler: quiet-hour
//! membership, the daily-digest firing window, and the reminder horizon.
//! Everything here is a pure function of its arguments so the gates can be
//! tested without a wall clock.

use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

/// The digest fires when the current time is within this many minutes of
/// the configured time-of-day, on either side.
pub const DIGEST_WINDOW_MINUTES: i64 = 15;

/// Parses an `HH:MM` 24-hour clock string into minutes of day.
pub fn parse_clock(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: u32 = hours.parse().ok()?;
    let minutes: u32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

pub fn minutes_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Whether `now` (minutes of day) falls inside the `[start, end)` window.
///
/// When `start > end` the window wraps past midnight (e.g. 22:00-08:00)
/// and membership is `now >= start || now < end`.
pub fn window_contains(now: u32, start: u32, end: u32) -> bool {
    if start > end {
        now >= start || now < end
    } else {
        now >= start && now < end
    }
}

/// Whether `now` is within [`DIGEST_WINDOW_MINUTES`] of the configured
/// digest time, both expressed in minutes of day.
pub fn within_digest_window(now: u32, digest_time: u32) -> bool {
    (i64::from(now) - i64::from(digest_time)).abs() <= DIGEST_WINDOW_MINUTES
}

/// Upper bound of the reminder horizon: a task qualifies for a reminder
/// when its deadline falls in `[now, now + reminder_hours]`.
pub fn reminder_window_end(now: DateTime<Utc>, reminder_hours: u32) -> DateTime<Utc> {
    now + Duration::hours(i64::from(reminder_hours))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(value: &str) -> u32 {
        parse_clock(value).unwrap()
    }

    #[test]
    fn parse_clock_accepts_valid_times() {
        assert_eq!(parse_clock("00:00"), Some(0));
        assert_eq!(parse_clock("08:00"), Some(480));
        assert_eq!(parse_clock("23:59"), Some(1439));
    }

    #[test]
    fn parse_clock_rejects_garbage() {
        assert_eq!(parse_clock("24:00"), None);
        assert_eq!(parse_clock("08:60"), None);
        assert_eq!(parse_clock("0800"), None);
        assert_eq!(parse_clock("eight"), None);
        assert_eq!(parse_clock(""), None);
    }

    #[test]
    fn overnight_window_wraps_past_midnight() {
        let (start, end) = (clock("22:00"), clock("08:00"));
        assert!(window_contains(clock("23:00"), start, end));
        assert!(window_contains(clock("03:00"), start, end));
        assert!(window_contains(clock("07:59"), start, end));
        assert!(!window_contains(clock("08:00"), start, end));
        assert!(!window_contains(clock("12:00"), start, end));
        assert!(!window_contains(clock("21:59"), start, end));
        assert!(window_contains(clock("22:00"), start, end));
    }

    #[test]
    fn same_day_window_is_half_open() {
        let (start, end) = (clock("08:00"), clock("22:00"));
        assert!(window_contains(clock("08:00"), start, end));
        assert!(window_contains(clock("12:00"), start, end));
        assert!(window_contains(clock("21:59"), start, end));
        assert!(!window_contains(clock("22:00"), start, end));
        assert!(!window_contains(clock("03:00"), start, end));
    }

    #[test]
    fn digest_window_is_fifteen_minutes_inclusive() {
        let digest = clock("08:00");
        assert!(within_digest_window(clock("07:45"), digest));
        assert!(!within_digest_window(clock("07:44"), digest));
        assert!(within_digest_window(clock("08:00"), digest));
        assert!(within_digest_window(clock("08:15"), digest));
        assert!(!within_digest_window(clock("08:16"), digest));
    }

    #[test]
    fn reminder_window_end_adds_whole_hours() {
        let now = Utc::now();
        assert_eq!(reminder_window_end(now, 24), now + Duration::hours(24));
        assert_eq!(reminder_window_end(now, 1), now + Duration::hours(1));
    }
}
