//! Calendar-aware lateness intervals.
//!
//! A lateness delay may include month and day components whose absolute length
//! varies. [`CalendarInterval`] keeps those components separate and only collapses
//! them into milliseconds when the delay is attached to a schema.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::TimeError;

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Days a month counts for when an interval is collapsed to milliseconds.
///
/// Using the longest month keeps the derived watermark conservative.
pub const DAYS_PER_MONTH: i64 = 31;

const MICROS_PER_MILLI: i64 = 1_000;
const MICROS_PER_SECOND: i64 = 1_000_000;
const MICROS_PER_MINUTE: i64 = 60 * MICROS_PER_SECOND;
const MICROS_PER_HOUR: i64 = 60 * MICROS_PER_MINUTE;

/// An interval with separate month, day, and sub-day components.
///
/// # Example
///
/// ```rust
/// use laminar_watermark::time::CalendarInterval;
///
/// let delay: CalendarInterval = "1 hour 30 minutes".parse().unwrap();
/// assert_eq!(delay.delay_ms(), 5_400_000);
///
/// let monthly: CalendarInterval = "1 month".parse().unwrap();
/// assert_eq!(monthly.delay_ms(), 31 * 86_400_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CalendarInterval {
    /// Whole months
    pub months: i32,
    /// Whole days
    pub days: i32,
    /// Sub-day remainder in microseconds
    pub micros: i64,
}

impl CalendarInterval {
    /// The empty interval.
    pub const ZERO: Self = Self {
        months: 0,
        days: 0,
        micros: 0,
    };

    /// Creates an interval from its components.
    #[must_use]
    pub const fn new(months: i32, days: i32, micros: i64) -> Self {
        Self {
            months,
            days,
            micros,
        }
    }

    /// Creates an interval with only a millisecond component.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self::new(0, 0, millis.saturating_mul(MICROS_PER_MILLI))
    }

    /// Creates an interval from a fixed-length duration.
    ///
    /// Durations beyond the microsecond range saturate.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Self::new(0, 0, micros)
    }

    /// Collapses the interval into milliseconds.
    ///
    /// Months count as [`DAYS_PER_MONTH`] days. Every combination of components
    /// fits an `i64`.
    #[must_use]
    pub fn delay_ms(&self) -> i64 {
        let month_ms = i64::from(self.months)
            .saturating_mul(DAYS_PER_MONTH)
            .saturating_mul(MILLIS_PER_DAY);
        let day_ms = i64::from(self.days).saturating_mul(MILLIS_PER_DAY);
        (self.micros / MICROS_PER_MILLI)
            .saturating_add(day_ms)
            .saturating_add(month_ms)
    }

    /// Returns true if the interval has no length.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Returns true if any component is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.months < 0 || self.days < 0 || self.micros < 0
    }

    fn checked_add_micros(self, micros: i64) -> Option<Self> {
        Some(Self {
            micros: self.micros.checked_add(micros)?,
            ..self
        })
    }
}

impl fmt::Display for CalendarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::with_capacity(3);
        if self.months != 0 {
            parts.push(format!("{} months", self.months));
        }
        if self.days != 0 {
            parts.push(format!("{} days", self.days));
        }
        if self.micros != 0 || parts.is_empty() {
            if self.micros % MICROS_PER_MILLI == 0 {
                parts.push(format!("{} milliseconds", self.micros / MICROS_PER_MILLI));
            } else {
                parts.push(format!("{} microseconds", self.micros));
            }
        }
        f.write_str(&parts.join(" "))
    }
}

/// Unit of one `<value> <unit>` pair.
enum Unit {
    Months(i64),
    Days(i64),
    Micros(i64),
}

fn parse_unit(unit: &str) -> Option<Unit> {
    let unit = unit.to_ascii_lowercase();
    let parsed = match unit.as_str() {
        "year" | "years" | "y" => Unit::Months(12),
        "month" | "months" | "mon" | "mons" => Unit::Months(1),
        "week" | "weeks" | "w" => Unit::Days(7),
        "day" | "days" | "d" => Unit::Days(1),
        "hour" | "hours" | "h" => Unit::Micros(MICROS_PER_HOUR),
        "minute" | "minutes" | "min" | "mins" | "m" => Unit::Micros(MICROS_PER_MINUTE),
        "second" | "seconds" | "sec" | "secs" | "s" => Unit::Micros(MICROS_PER_SECOND),
        "millisecond" | "milliseconds" | "ms" => Unit::Micros(MICROS_PER_MILLI),
        "microsecond" | "microseconds" | "us" => Unit::Micros(1),
        _ => return None,
    };
    Some(parsed)
}

impl FromStr for CalendarInterval {
    type Err = TimeError;

    /// Parses strings like `"10 minutes"`, `"INTERVAL 1 day 2 hours"` or `"1 month"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: String| TimeError::InvalidInterval {
            input: s.to_string(),
            reason,
        };

        let mut tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens
            .first()
            .is_some_and(|t| t.eq_ignore_ascii_case("interval"))
        {
            tokens.remove(0);
        }
        if tokens.is_empty() {
            return Err(invalid("empty interval".to_string()));
        }
        if tokens.len() % 2 != 0 {
            return Err(invalid("expected '<value> <unit>' pairs".to_string()));
        }

        let mut months: i64 = 0;
        let mut days: i64 = 0;
        let mut interval = Self::ZERO;
        for pair in tokens.chunks_exact(2) {
            let value: i64 = pair[0]
                .trim_matches('\'')
                .parse()
                .map_err(|_| invalid(format!("invalid value '{}'", pair[0])))?;
            let unit =
                parse_unit(pair[1]).ok_or_else(|| invalid(format!("unknown unit '{}'", pair[1])))?;
            let overflow = || invalid("component overflow".to_string());
            match unit {
                Unit::Months(scale) => {
                    months = value
                        .checked_mul(scale)
                        .and_then(|m| months.checked_add(m))
                        .ok_or_else(overflow)?;
                }
                Unit::Days(scale) => {
                    days = value
                        .checked_mul(scale)
                        .and_then(|d| days.checked_add(d))
                        .ok_or_else(overflow)?;
                }
                Unit::Micros(scale) => {
                    interval = value
                        .checked_mul(scale)
                        .and_then(|us| interval.checked_add_micros(us))
                        .ok_or_else(overflow)?;
                }
            }
        }

        interval.months = i32::try_from(months)
            .map_err(|_| TimeError::IntervalOverflow(format!("{months} months")))?;
        interval.days =
            i32::try_from(days).map_err(|_| TimeError::IntervalOverflow(format!("{days} days")))?;
        Ok(interval)
    }
}

impl TryFrom<String> for CalendarInterval {
    type Error = TimeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CalendarInterval> for String {
    fn from(interval: CalendarInterval) -> Self {
        interval.to_string()
    }
}

impl From<Duration> for CalendarInterval {
    fn from(duration: Duration) -> Self {
        Self::from_duration(duration)
    }
}
