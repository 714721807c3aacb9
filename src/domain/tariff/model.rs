//! Tariff domain entities

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::shared::money::round_money;

const SECONDS_PER_HOUR: i64 = 3600;

/// A named, recurring time-of-day window. Half-open `[start, end)`;
/// `end <= start` wraps midnight, `start == end` covers the full day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shift {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl Shift {
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start_time == self.end_time {
            true
        } else if self.crosses_midnight() {
            t >= self.start_time || t < self.end_time
        } else {
            t >= self.start_time && t < self.end_time
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_time < self.start_time
    }
}

/// Result of `getShiftRateAssignment(parkingId, shiftId)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedRate {
    pub rate_id: i32,
    /// Amount per billing hour
    pub hourly_amount: Decimal,
    pub currency: String,
}

/// How partial hours are billed. Applied uniformly to every
/// sub-interval of a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Prorate by elapsed time over the billable minutes.
    #[default]
    PerMinute,
    /// Round each sub-interval up to the next whole hour.
    PerStartedHour,
}

impl RoundingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerMinute => "per_minute",
            Self::PerStartedHour => "per_started_hour",
        }
    }

    /// Billed hours for a sub-interval of `seconds`.
    pub fn billable_hours(&self, seconds: i64) -> Decimal {
        let seconds = seconds.max(0);
        match self {
            Self::PerMinute => Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR),
            Self::PerStartedHour => {
                Decimal::from((seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR)
            }
        }
    }

    /// Unrounded charge for `seconds` at `hourly`. Multiplies before
    /// dividing so exact results stay exact.
    pub fn charge(&self, seconds: i64, hourly: Decimal) -> Decimal {
        let seconds = seconds.max(0);
        match self {
            Self::PerMinute => {
                (Decimal::from(seconds) * hourly / Decimal::from(SECONDS_PER_HOUR)).normalize()
            }
            Self::PerStartedHour => self.billable_hours(seconds) * hourly,
        }
    }
}

/// One billed sub-interval of a stay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffLine {
    pub shift_id: i32,
    pub shift_code: String,
    pub rate_id: i32,
    pub hourly_amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub seconds: i64,
    pub billed_hours: Decimal,
    /// Unrounded line amount (4 decimal places)
    pub amount: Decimal,
}

/// Output of the tariff resolver
#[derive(Debug, Clone, PartialEq)]
pub struct TariffQuote {
    pub parking_id: i32,
    pub billable_minutes: i64,
    pub lines: Vec<TariffLine>,
    /// Sum of the line amounts, rounded half-up to 2 decimals
    pub amount: Decimal,
    pub currency: String,
    pub rounding: RoundingPolicy,
}

impl TariffQuote {
    pub fn rate_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.lines.iter().map(|l| l.rate_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Total over unrounded line amounts, rounded once.
    pub fn total_of(lines: &[TariffLine]) -> Decimal {
        round_money(lines.iter().map(|l| l.amount).sum())
    }
}

/// `ceil(seconds / 60)`, minimum one minute.
pub fn duration_minutes(entry: DateTime<Utc>, exit: DateTime<Utc>) -> i64 {
    let seconds = (exit - entry).num_seconds().max(0);
    ((seconds + 59) / 60).max(1)
}

// ── Tests ──────────────────────────────────────────────────────
