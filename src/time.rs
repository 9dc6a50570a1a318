// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Duration and calendar-date codecs
//!
//! Durations are integer milliseconds, dates are epoch milliseconds (UTC).
//! `-1` is the "unset" sentinel for both.

use crate::types::UNSET;
use chrono::{DateTime, Local, NaiveDate, Utc};
use thiserror::Error;

/// Errors raised by strictly malformed duration strings
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeError {
    /// The fraction after `.` has neither 2 nor 3 digits
    #[error("invalid time format {input:?}: fraction must have 2 or 3 digits")]
    Fraction {
        /// Offending input
        input: String,
    },
    /// Too many (or too few) colon-separated groups
    #[error("invalid time format {input:?}: expected 1 to 3 colon-separated groups, got {groups}")]
    Groups {
        /// Offending input
        input: String,
        /// Number of groups found
        groups: usize,
    },
    /// A group is not a non-negative integer
    #[error("invalid time format {input:?}: {part:?} is not a number")]
    Number {
        /// Offending input
        input: String,
        /// Offending group
        part: String,
    },
    /// The duration does not fit into milliseconds as `i64`
    #[error("invalid time format {input:?}: duration is out of range")]
    Overflow {
        /// Offending input
        input: String,
    },
}

/// How a two-group string without fraction is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TwoGroups {
    MinutesSeconds,
    HoursMinutes,
}

/// Parse a real-time duration into milliseconds.
///
/// Accepted: `h:mm:ss.xxx`, `h:mm:ss.xx`, `mm:ss.xxx`, `mm:ss.xx`, `ss.xxx`,
/// `ss.xx`, `h:mm:ss`, `hh:mm:ss`, `mm:ss` and plain seconds. Absent input,
/// `""` and `"-1"` yield `-1`.
pub fn parse_time<'a>(time: impl Into<Option<&'a str>>) -> Result<i64, TimeError> {
    parse_with(time.into(), TwoGroups::MinutesSeconds)
}

/// Parse a game-time duration into milliseconds.
///
/// Same grammar as [`parse_time`] except that two groups without a fraction
/// read as `h:mm`: in-game clocks never show seconds without a fraction.
pub fn parse_game_time<'a>(time: impl Into<Option<&'a str>>) -> Result<i64, TimeError> {
    parse_with(time.into(), TwoGroups::HoursMinutes)
}

fn parse_with(time: Option<&str>, two_groups: TwoGroups) -> Result<i64, TimeError> {
    let Some(time) = time.filter(|t| !t.is_empty() && *t != "-1") else {
        return Ok(UNSET);
    };

    let (clock, fraction) = match time.split_once('.') {
        Some((clock, fraction)) if !fraction.is_empty() => (clock, Some(fraction)),
        Some((clock, _)) => (clock, None),
        None => (time, None),
    };

    let number = |part: &str| -> Result<i64, TimeError> {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TimeError::Number {
                input: time.to_string(),
                part: part.to_string(),
            });
        }
        part.parse::<i64>().map_err(|_| TimeError::Number {
            input: time.to_string(),
            part: part.to_string(),
        })
    };

    let ms = match fraction {
        Some(f) if f.len() == 2 => number(f)? * 10,
        Some(f) if f.len() == 3 => number(f)?,
        Some(_) => {
            return Err(TimeError::Fraction {
                input: time.to_string(),
            })
        }
        None => 0,
    };

    let parts: Vec<&str> = clock.split(':').collect();
    let (h, m, s) = match parts.as_slice() {
        [h, m, s] => (number(*h)?, number(*m)?, number(*s)?),
        [a, b] if fraction.is_none() && two_groups == TwoGroups::HoursMinutes => {
            (number(*a)?, number(*b)?, 0)
        }
        [m, s] => (0, number(*m)?, number(*s)?),
        [s] => (0, 0, number(*s)?),
        _ => {
            return Err(TimeError::Groups {
                input: time.to_string(),
                groups: parts.len(),
            })
        }
    };

    h.checked_mul(60)
        .and_then(|v| v.checked_add(m))
        .and_then(|v| v.checked_mul(60))
        .and_then(|v| v.checked_add(s))
        .and_then(|v| v.checked_mul(1000))
        .and_then(|v| v.checked_add(ms))
        .ok_or_else(|| TimeError::Overflow {
            input: time.to_string(),
        })
}

/// Format epoch milliseconds as `YYYY-MM-DD` (UTC).
///
/// Negative input maps to the epoch start.
#[must_use]
pub fn format_date(date: i64) -> String {
    if date < 0 {
        return "1970-01-01".to_string();
    }
    DateTime::<Utc>::from_timestamp_millis(date)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "1970-01-01".to_string())
}

/// Parse a date string into epoch milliseconds, `-1` when absent or invalid.
///
/// Plain dates are read as UTC midnight; full RFC 3339 timestamps are
/// accepted as well.
#[must_use]
pub fn parse_date<'a>(date: impl Into<Option<&'a str>>) -> i64 {
    let Some(date) = date.into().map(str::trim).filter(|d| !d.is_empty()) else {
        return UNSET;
    };

    if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return day
            .and_hms_opt(0, 0, 0)
            .map_or(UNSET, |dt| dt.and_utc().timestamp_millis());
    }

    DateTime::parse_from_rfc3339(date).map_or(UNSET, |dt| dt.timestamp_millis())
}

/// Today's local date as `YYYY-MM-DD`
#[must_use]
pub fn current_date() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Split milliseconds into hours, minutes, seconds, centiseconds and the
/// millisecond remainder.
#[must_use]
pub fn split_time(ms: i64) -> (i64, i64, i64, i64, i64) {
    let h = ms / 3_600_000;
    let ms = ms % 3_600_000;
    let m = ms / 60_000;
    let ms = ms % 60_000;
    let s = ms / 1000;
    let ms = ms % 1000;
    (h, m, s, ms / 10, ms)
}

/// `h:mm`; never trims the hour
#[must_use]
pub fn format_time_hm(ms: i64) -> String {
    if ms < 0 {
        return "-1".to_string();
    }
    let (h, m, ..) = split_time(ms);
    format!("{h}:{m:02}")
}

/// `h:mm:ss`, or `m:ss` when the hour is zero and `trim_zero` is set
#[must_use]
pub fn format_time_hms(ms: i64, trim_zero: bool) -> String {
    if ms < 0 {
        return "-1".to_string();
    }
    let (h, m, s, ..) = split_time(ms);
    if h != 0 || !trim_zero {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// `h:mm:ss.cc`; with `trim_zero`, leading zero hour and minute are dropped
#[must_use]
pub fn format_time_full(ms: i64, trim_zero: bool) -> String {
    if ms < 0 {
        return "-1".to_string();
    }
    let (h, m, s, cs, _) = split_time(ms);
    if h != 0 || !trim_zero {
        format!("{h}:{m:02}:{s:02}.{cs:02}")
    } else if m != 0 {
        format!("{m}:{s:02}.{cs:02}")
    } else {
        format!("{s}.{cs:02}")
    }
}
