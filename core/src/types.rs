//! Shared primitive types used across the entire analytics core.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// A stable identifier for a customer or an agent.
pub type EntityId = String;

/// Customer id used when a ticket carries none.
pub const UNKNOWN_CUSTOMER: &str = "Unknown";

/// Agent id used when a ticket carries no "open by".
pub const UNASSIGNED_AGENT: &str = "Unassigned";

/// A calendar month. Orders chronologically (year first, then month).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year:  i32,
    pub month: u32,
}

impl MonthKey {
    /// Returns `None` unless `month` is in 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn of(instant: &NaiveDateTime) -> Self {
        Self {
            year:  instant.year(),
            month: instant.month(),
        }
    }

    /// The immediately preceding calendar month (January rolls back a year).
    pub fn pred(self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Midnight on the first day of the month.
    pub fn first_instant(self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)?.and_hms_opt(0, 0, 0)
    }

    /// 23:59:59.999 on the last day of the month.
    pub fn last_instant(self) -> Option<NaiveDateTime> {
        let next = self.succ();
        let last_day = NaiveDate::from_ymd_opt(next.year, next.month, 1)?.pred_opt()?;
        last_day.and_hms_milli_opt(23, 59, 59, 999)
    }

    /// Chart label in `MM/YYYY` form.
    pub fn label(self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid month key '{0}', expected YYYY-MM")]
pub struct ParseMonthKeyError(pub String);

impl FromStr for MonthKey {
    type Err = ParseMonthKeyError;

    /// Parses the `YYYY-MM` form written by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ParseMonthKeyError(s.to_string());
        let (year, month) = s.rsplit_once('-').ok_or_else(bad)?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u32 = month.parse().map_err(|_| bad())?;
        MonthKey::new(year, month).ok_or_else(bad)
    }
}

/// Serde adapter for month-keyed maps. JSON object keys must be strings,
/// so keys go through the `YYYY-MM` form.
///
/// ```ignore
/// #[serde(with = "crate::types::month_map")]
/// months: BTreeMap<MonthKey, MonthlyMetrics>,
/// ```
pub mod month_map {
    use super::MonthKey;
    use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<V, S>(map: &BTreeMap<MonthKey, V>, serializer: S) -> Result<S::Ok, S::Error>
    where
        V: Serialize,
        S: Serializer,
    {
        serializer.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
    }

    pub fn deserialize<'de, V, D>(deserializer: D) -> Result<BTreeMap<MonthKey, V>, D::Error>
    where
        V: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        BTreeMap::<String, V>::deserialize(deserializer)?
            .into_iter()
            .map(|(k, v)| k.parse::<MonthKey>().map(|key| (key, v)).map_err(D::Error::custom))
            .collect()
    }
}
