//! Shared primitive types used across the entire engine.

use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A stable, unique identifier for any entity supplied by the store.
pub type EntityId = String;

pub type BusinessUnitId = EntityId;
pub type CashRegisterId = EntityId;
pub type CompanyId = EntityId;

/// A calendar-month key ("YYYY-MM") identifying which month a goal covers.
///
/// Ordering is chronological: `2023-12 < 2024-01 < 2024-07`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey {
    year:  i32,
    month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> EngineResult<Self> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(EngineError::InvalidPeriod(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year:  date.year(),
            month: date.month(),
        }
    }

    /// Period a timestamp falls in, as seen from the store's local offset.
    pub fn from_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::from_date(ts.with_timezone(&offset).date_naive())
    }

    /// The month containing `now` in the store's local time.
    pub fn current(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self::from_timestamp(now, offset)
    }

    /// First and last calendar day of the month.
    pub fn date_span(&self) -> EngineResult<(NaiveDate, NaiveDate)> {
        let invalid = || EngineError::InvalidPeriod(self.to_string());
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(invalid)?;
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        let last = next.and_then(|d| d.pred_opt()).ok_or_else(invalid)?;
        Ok((first, last))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for PeriodKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidPeriod(s.to_string());
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        if y.len() != 4 || m.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl Serialize for PeriodKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PeriodKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// UTC instants bounding the local calendar days `from..=to`, as a
/// half-open interval `[start, end)`.
pub fn local_day_span(
    from: NaiveDate,
    to: NaiveDate,
    offset: FixedOffset,
) -> EngineResult<(DateTime<Utc>, DateTime<Utc>)> {
    let end_day = to
        .succ_opt()
        .ok_or_else(|| EngineError::validation("date_range", format!("{to} has no successor")))?;
    let at_midnight = |day: NaiveDate| -> EngineResult<DateTime<Utc>> {
        day.and_hms_opt(0, 0, 0)
            .and_then(|ndt| offset.from_local_datetime(&ndt).single())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| EngineError::validation("date_range", format!("cannot place {day} in {offset}")))
    };
    Ok((at_midnight(from)?, at_midnight(end_day)?))
}
