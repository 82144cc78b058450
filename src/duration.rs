//! Duration Parser
//!
//! Converts human-readable duration expressions ("2s", "5m", "1.5 hours")
//! or plain millisecond counts into milliseconds.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{CacheError, Result};

// == Well-known Durations (milliseconds) ==
pub const ONE_SECOND: u64 = 1_000;
pub const ONE_MINUTE: u64 = 60 * ONE_SECOND;
pub const ONE_HOUR: u64 = 60 * ONE_MINUTE;
pub const ONE_DAY: u64 = 24 * ONE_HOUR;
pub const ONE_WEEK: u64 = 7 * ONE_DAY;
pub const ONE_MONTH: u64 = 2_628_000_000;
pub const ONE_YEAR: u64 = 31_557_600_000;

static DURATION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(-?(?:\d+)?\.?\d+) *(milliseconds?|msecs?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|weeks?|w|years?|yrs?|y)?$",
    )
    .expect("duration pattern is valid")
});

// == Expiry ==
/// An expiry as supplied by callers.
///
/// `Never` is an explicit "no expiry" override; omitting the expiry
/// altogether falls back to the cache default instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// Absolute millisecond count
    Millis(u64),
    /// Human expression such as "10s" or "2 days"
    Text(String),
    /// Explicitly never expire
    Never,
}

impl Expiry {
    /// Resolves this expiry into milliseconds, `None` meaning no expiry.
    pub fn to_millis(&self) -> Result<Option<u64>> {
        match self {
            Expiry::Millis(ms) => Ok(Some(*ms)),
            Expiry::Text(text) => parse_duration(text).map(Some),
            Expiry::Never => Ok(None),
        }
    }
}

impl From<u64> for Expiry {
    fn from(ms: u64) -> Self {
        Expiry::Millis(ms)
    }
}

impl From<&str> for Expiry {
    fn from(text: &str) -> Self {
        Expiry::Text(text.to_string())
    }
}

impl From<String> for Expiry {
    fn from(text: String) -> Self {
        Expiry::Text(text)
    }
}

impl From<Duration> for Expiry {
    fn from(duration: Duration) -> Self {
        Expiry::Millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Parses an optional expiry. Absent input means no expiry.
pub fn parse_expiry(input: Option<&Expiry>) -> Result<Option<u64>> {
    match input {
        Some(expiry) => expiry.to_millis(),
        None => Ok(None),
    }
}

// == Parse Duration ==
/// Parses a duration expression into milliseconds.
///
/// A bare number is read as milliseconds. Fractions are accepted
/// ("1.5h") and rounded to the nearest millisecond. Negative values are
/// rejected since an expiry cannot lie in the past.
pub fn parse_duration(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let invalid = || CacheError::InvalidDuration(input.to_string());

    if trimmed.is_empty() || trimmed.len() > 100 {
        return Err(invalid());
    }

    let captures = DURATION_PATTERN.captures(trimmed).ok_or_else(invalid)?;
    let amount: f64 = captures[1].parse().map_err(|_| invalid())?;
    if amount < 0.0 {
        return Err(invalid());
    }

    let unit = captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .unwrap_or_else(|| "ms".to_string());

    let multiplier = match unit.as_str() {
        "years" | "year" | "yrs" | "yr" | "y" => ONE_YEAR,
        "weeks" | "week" | "w" => ONE_WEEK,
        "days" | "day" | "d" => ONE_DAY,
        "hours" | "hour" | "hrs" | "hr" | "h" => ONE_HOUR,
        "minutes" | "minute" | "mins" | "min" | "m" => ONE_MINUTE,
        "seconds" | "second" | "secs" | "sec" | "s" => ONE_SECOND,
        _ => 1,
    };

    Ok((amount * multiplier as f64).round() as u64)
}
