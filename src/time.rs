use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Units accepted by a relative time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl TimeUnit {
    pub fn all() -> [TimeUnit; 8] {
        use TimeUnit::*;
        [Milliseconds, Seconds, Minutes, Hours, Days, Weeks, Months, Years]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnit::Milliseconds => "milliseconds",
            TimeUnit::Seconds => "seconds",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Hours => "hours",
            TimeUnit::Days => "days",
            TimeUnit::Weeks => "weeks",
            TimeUnit::Months => "months",
            TimeUnit::Years => "years",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnit::all()
            .into_iter()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown time unit '{}'", s))
    }
}

/// Relative shift of a target's query range. `value` is `None` while the user has
/// enabled the override but not filled the amount in yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeOffset {
    pub value: Option<f64>,
    pub unit: TimeUnit,
}

impl TimeOffset {
    pub fn new(value: f64, unit: TimeUnit) -> Self {
        Self {
            value: Some(value),
            unit,
        }
    }
}

impl Default for TimeOffset {
    fn default() -> Self {
        TimeOffset::new(1.0, TimeUnit::Hours)
    }
}

/// Relative bound of a time override, same shape as the offset.
pub type RelativeTime = TimeOffset;

/// Per-metric replacement of the request's time range.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_relative: Option<RelativeTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_relative: Option<RelativeTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_absolute: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_absolute: Option<i64>,
}

/// Length of `offset` in milliseconds, measured forward from `now`.
///
/// Months and years follow the calendar, so the result depends on `now`.
/// An offset without a value has no length.
pub fn compute_offset_ms(offset: &TimeOffset, now: DateTime<Utc>) -> Option<i64> {
    let value = offset.value?;
    let fixed = |unit_ms: f64| (value * unit_ms).round() as i64;

    let offset_ms = match offset.unit {
        TimeUnit::Milliseconds => fixed(1.0),
        TimeUnit::Seconds => fixed(1_000.0),
        TimeUnit::Minutes => fixed(60_000.0),
        TimeUnit::Hours => fixed(3_600_000.0),
        TimeUnit::Days => fixed(86_400_000.0),
        TimeUnit::Weeks => fixed(604_800_000.0),
        TimeUnit::Months => calendar_offset_ms(now, value.round() as i64),
        TimeUnit::Years => calendar_offset_ms(now, value.round() as i64 * 12),
    };
    Some(offset_ms)
}

fn calendar_offset_ms(now: DateTime<Utc>, months: i64) -> i64 {
    let magnitude = Months::new(months.unsigned_abs().min(u32::MAX as u64) as u32);
    let shifted = if months >= 0 {
        now.checked_add_months(magnitude)
    } else {
        now.checked_sub_months(magnitude)
    };
    shifted
        .map(|target| (target - now).num_milliseconds())
        // Out of chrono's range: fall back to an average month
        .unwrap_or_else(|| (Duration::days(30).num_milliseconds() as f64 * months as f64) as i64)
}

/// Shifts the dashboard range `[from, to]` (Unix seconds) backwards by `offset`.
///
/// Returns `None` without an offset or while its value is unset; the override
/// carries millisecond bounds.
pub fn time_override_from_offset(
    offset: Option<&TimeOffset>,
    from: i64,
    to: i64,
    now: DateTime<Utc>,
) -> Option<TimeOverride> {
    let offset_ms = compute_offset_ms(offset?, now)?;
    Some(TimeOverride {
        start_absolute: Some(from * 1000 - offset_ms),
        end_absolute: Some(to * 1000 - offset_ms),
        ..TimeOverride::default()
    })
}
