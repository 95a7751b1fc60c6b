//! Time utilities for timeclockd
//!
//! Provides the wall clock used for every attendance decision plus the
//! workday arithmetic shown to the presentation layer.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `TIMECLOCK_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising calendar and shift logic on a chosen day.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-10-15 09:00:00`)
//!
//! Example:
//! ```bash
//! TIMECLOCK_MOCK_TIME="2025-10-15 09:00:00" timeclockd
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

use crate::{Result, TimeclockError};

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "TIMECLOCK_MOCK_TIME";

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Cached mock time offset from the real time when the process started.
/// This allows mock time to advance naturally.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

/// Offset that moves `real_now` to the wall time in `mock_time`
#[cfg_attr(not(debug_assertions), allow(dead_code))]
fn mock_offset(mock_time: &str, real_now: DateTime<Local>) -> Option<chrono::Duration> {
    let naive = NaiveDateTime::parse_from_str(mock_time, MOCK_TIME_FORMAT).ok()?;
    let mock_dt = Local.from_local_datetime(&naive).single()?;
    Some(mock_dt.signed_duration_since(real_now))
}

#[allow(clippy::disallowed_methods)] // This is the internal implementation that wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match mock_offset(&mock_time_str, chrono::Local::now()) {
                    Some(offset) => {
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time, using system time"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Get the current local time, respecting mock time settings in debug builds.
#[allow(clippy::disallowed_methods)] // This is the wrapper that provides mock time support
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    if let Some(offset) = get_mock_time_offset() {
        real_now + offset
    } else {
        real_now
    }
}

/// Format a DateTime for display with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// A time of day with minute resolution, as found in shift records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse `HH:MM`.
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| format!("Expected HH:MM format, got '{}'", s))?;

        let hour: u8 = hour
            .parse()
            .map_err(|_| format!("Invalid hour in '{}'", s))?;
        let minute: u8 = minute
            .parse()
            .map_err(|_| format!("Invalid minute in '{}'", s))?;

        Self::new(hour, minute).ok_or_else(|| format!("Time out of range: '{}'", s))
    }

    pub fn from_naive_time(time: NaiveTime) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn of(dt: &DateTime<Local>) -> Self {
        Self::from_naive_time(dt.time())
    }

    pub fn minutes_from_midnight(&self) -> i64 {
        i64::from(self.hour) * 60 + i64::from(self.minute)
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minutes_from_midnight()
            .cmp(&other.minutes_from_midnight())
    }
}

/// Local timestamp in the form the attendance write endpoints expect:
/// `YYYY-MM-DDTHH:MM:00`.
pub fn attendance_timestamp(date: NaiveDate, time: WallClock) -> String {
    format!("{}T{}:00", date.format("%Y-%m-%d"), time)
}

/// Hours worked since `clock_in` (an `HH:MM` string) up to `now`.
///
/// Same-day arithmetic only; seconds are ignored.
pub fn calculate_worked_hours(clock_in: &str, now: &DateTime<Local>) -> Result<f64> {
    let start = WallClock::parse(clock_in)
        .map_err(|e| TimeclockError::api(format!("Malformed clock-in time: {}", e)))?;
    let worked_minutes = WallClock::of(now).minutes_from_midnight() - start.minutes_from_midnight();
    Ok(worked_minutes as f64 / 60.0)
}

/// Hours left in a workday of `workday_hours`. Negative means overtime.
pub fn calculate_remaining_hours(
    clock_in: &str,
    workday_hours: u8,
    now: &DateTime<Local>,
) -> Result<f64> {
    let worked = calculate_worked_hours(clock_in, now)?;
    Ok(f64::from(workday_hours) - worked)
}

/// Split fractional hours into whole hours and minutes, truncating toward zero.
pub fn format_remaining_time(hours: f64) -> (i64, i64) {
    let h = hours.trunc() as i64;
    let m = ((hours - h as f64) * 60.0).trunc() as i64;
    (h, m)
}

/// Render hours and minutes as `"6h 15m"`, or `"45m"` when there are no hours.
pub fn format_time_display(hours: i64, minutes: i64) -> String {
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    fn at(hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 10, 15, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_wall_clock_parse() {
        assert_eq!(WallClock::parse("09:05").unwrap(), WallClock::new(9, 5).unwrap());
        assert_eq!(WallClock::parse("23:59").unwrap(), WallClock::new(23, 59).unwrap());

        assert!(WallClock::parse("24:00").is_err());
        assert!(WallClock::parse("12:60").is_err());
        assert!(WallClock::parse("0900").is_err());
        assert!(WallClock::parse("").is_err());
    }

    #[test]
    fn test_wall_clock_ordering_and_display() {
        let morning = WallClock::new(8, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();
        assert!(morning < evening);
        assert_eq!(morning.to_string(), "08:00");
    }

    #[test]
    fn test_remaining_hours_through_the_day() {
        assert_eq!(calculate_remaining_hours("09:00", 8, &at(9, 0)).unwrap(), 8.0);
        assert_eq!(calculate_remaining_hours("09:00", 8, &at(17, 0)).unwrap(), 0.0);
        assert_eq!(calculate_remaining_hours("09:00", 8, &at(18, 30)).unwrap(), -1.5);
    }

    #[test]
    fn test_remaining_hours_rejects_bad_clock_in() {
        let err = calculate_remaining_hours("9am", 8, &at(10, 0)).unwrap_err();
        assert!(err.is_api_failure());
    }

    #[test]
    fn test_worked_hours_ignores_seconds() {
        let now = Local.with_ymd_and_hms(2025, 10, 15, 10, 30, 59).unwrap();
        assert_eq!(calculate_worked_hours("09:00", &now).unwrap(), 1.5);
    }

    #[test]
    fn test_format_remaining_time() {
        assert_eq!(format_remaining_time(6.25), (6, 15));
        assert_eq!(format_remaining_time(0.75), (0, 45));
        assert_eq!(format_remaining_time(8.0), (8, 0));
    }

    #[test]
    fn test_format_time_display() {
        assert_eq!(format_time_display(0, 45), "45m");
        assert_eq!(format_time_display(6, 15), "6h 15m");
    }

    #[test]
    fn test_attendance_timestamp() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
        let time = WallClock::new(8, 7).unwrap();
        assert_eq!(attendance_timestamp(date, time), "2025-10-01T08:07:00");
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_now_returns_time() {
        let t = now();
        assert!(t.year() >= 2020);
        assert!(t.year() <= 2100);
    }

    #[test]
    fn test_parse_mock_time_format() {
        assert!(NaiveDateTime::parse_from_str("2025-10-15 09:00:00", MOCK_TIME_FORMAT).is_ok());
        assert!(NaiveDateTime::parse_from_str("2025-10-15T09:00:00", MOCK_TIME_FORMAT).is_err());
        assert!(NaiveDateTime::parse_from_str("not a date", MOCK_TIME_FORMAT).is_err());
    }

    #[test]
    fn test_mock_offset() {
        let real = Local.with_ymd_and_hms(2025, 10, 15, 8, 0, 0).unwrap();
        let offset = mock_offset("2025-10-15 09:30:00", real).unwrap();
        assert_eq!(offset, chrono::Duration::minutes(90));
        assert_eq!((real + offset).format("%H:%M").to_string(), "09:30");

        assert!(mock_offset("2025-10-15T09:30:00", real).is_none());
        assert!(mock_offset("", real).is_none());
    }
}
