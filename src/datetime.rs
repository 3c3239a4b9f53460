//! Date/time utilities for tempmail.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Source of the current time.
///
/// Mailbox expiry is evaluated against this clock, so tests can move time
/// forward without sleeping.
pub trait Clock: Send + Sync {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = add_duration(*now, by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Add a std duration to a timestamp, saturating on overflow.
pub fn add_duration(at: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|d| at.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Seconds remaining until `deadline`, zero if it has passed.
pub fn seconds_until(now: DateTime<Utc>, deadline: DateTime<Utc>) -> u64 {
    (deadline - now).num_seconds().max(0) as u64
}

/// Parse a message date header.
///
/// Accepts RFC 3339, RFC 2822 (the format mail headers use) and the plain
/// `YYYY-MM-DD HH:MM:SS` form, interpreted as UTC.
pub fn parse_message_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(start());
        assert_eq!(clock.now(), start());

        clock.advance(Duration::from_secs(90));
        assert_eq!(clock.now(), start() + chrono::Duration::seconds(90));
    }

    #[test]
    fn test_add_duration() {
        let later = add_duration(start(), Duration::from_secs(3600));
        assert_eq!(later, Utc.with_ymd_and_hms(2024, 1, 15, 11, 30, 0).unwrap());
    }

    #[test]
    fn test_add_duration_saturates() {
        let later = add_duration(start(), Duration::from_secs(u64::MAX));
        assert_eq!(later, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_seconds_until() {
        let deadline = start() + chrono::Duration::seconds(42);
        assert_eq!(seconds_until(start(), deadline), 42);
        assert_eq!(seconds_until(deadline, start()), 0);
    }

    #[test]
    fn test_parse_rfc3339() {
        let dt = parse_message_date("2024-01-15T10:30:00+09:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 1, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_rfc2822() {
        let dt = parse_message_date("Mon, 15 Jan 2024 10:30:00 +0000").unwrap();
        assert_eq!(dt, start());
    }

    #[test]
    fn test_parse_plain_format() {
        let dt = parse_message_date("2024-01-15 10:30:00").unwrap();
        assert_eq!(dt, start());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_message_date("yesterday").is_none());
        assert!(parse_message_date("").is_none());
    }
}
