//! Timetable clock times.
//!
//! The carrier reports times as zero-padded "HH:MM" strings. Services
//! running after midnight stay on the same service day and may be reported
//! with hours past 23 (the query window runs to "26"), so this type accepts
//! hours up to 29 rather than rejecting them.

use std::fmt;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Highest hour the carrier can report for a single service day.
const MAX_SERVICE_HOUR: u8 = 29;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct InvalidTime {
    reason: &'static str,
}

impl InvalidTime {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A minute-resolution time of day in timetable form.
///
/// Ordering is hour-then-minute, which is exactly the ordering of the
/// zero-padded "HH:MM" strings. Comparisons never wrap around midnight.
///
/// # Examples
///
/// ```
/// use cercanias_server::domain::ClockTime;
///
/// let t = ClockTime::parse_hhmm("08:07").unwrap();
/// assert_eq!(t.to_string(), "08:07");
/// assert!(ClockTime::parse_hhmm("08:10").unwrap() > t);
///
/// assert!(ClockTime::parse_hhmm("8:07").is_err());
/// assert!(ClockTime::parse_hhmm("08:60").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    hour: u8,
    minute: u8,
}

impl ClockTime {
    /// Create a time from hour and minute, if both are in range.
    pub fn new(hour: u8, minute: u8) -> Result<Self, InvalidTime> {
        if hour > MAX_SERVICE_HOUR {
            return Err(InvalidTime::new("hour must be 0-29"));
        }
        if minute > 59 {
            return Err(InvalidTime::new("minute must be 0-59"));
        }
        Ok(Self { hour, minute })
    }

    /// Parse a time from "HH:MM" format.
    pub fn parse_hhmm(s: &str) -> Result<Self, InvalidTime> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(InvalidTime::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();
        if bytes[2] != b':' {
            return Err(InvalidTime::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| InvalidTime::new("invalid hour digits"))?;
        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| InvalidTime::new("invalid minute digits"))?;

        Self::new(hour, minute)
    }

    /// Truncate a wall-clock time to minute resolution.
    pub fn from_naive_time(time: NaiveTime) -> Self {
        // hour() is 0-23 and minute() is 0-59, always in range
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Returns the hour (0-29).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }
}

fn parse_two_digits(bytes: &[u8]) -> Option<u8> {
    match bytes {
        [a, b] if a.is_ascii_digit() && b.is_ascii_digit() => Some((a - b'0') * 10 + (b - b'0')),
        _ => None,
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({self})")
    }
}

impl TryFrom<String> for ClockTime {
    type Error = InvalidTime;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse_hhmm(&s)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}
