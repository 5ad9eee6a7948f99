//! Time-window filter: restricts a batch to an inclusive month range.
//!
//! Two independent filter steps live here and stay separate:
//!   1. `filter_tickets`  drops tickets whose open time is outside the window.
//!   2. `month_in_window` drops month labels outside the window.
//! The monthly bucketer applies both; a month appears only if both agree.

use crate::{
    ticket::Ticket,
    types::MonthKey,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Year part of a filter window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YearSelection {
    /// The "all years" sentinel: every ticket passes.
    All,
    Year(i32),
}

/// The `{startMonth, endMonth, year | "ALL"}` value object.
///
/// Any absent part makes the window empty, unless the year is `All`.
/// `start_month > end_month` is accepted as given and yields an empty range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterWindow {
    pub start_month: Option<u32>,
    pub end_month:   Option<u32>,
    pub year:        Option<YearSelection>,
}

impl FilterWindow {
    pub fn months(year: i32, start_month: u32, end_month: u32) -> Self {
        Self {
            start_month: Some(start_month),
            end_month:   Some(end_month),
            year:        Some(YearSelection::Year(year)),
        }
    }

    pub fn all_years() -> Self {
        Self {
            start_month: None,
            end_month:   None,
            year:        Some(YearSelection::All),
        }
    }

    /// Single-month window on the latest datable ticket in the batch.
    pub fn latest_month_of(tickets: &[Ticket]) -> Option<Self> {
        let latest = tickets.iter().filter_map(Ticket::opened_at).max()?;
        let key = MonthKey::of(&latest);
        Some(Self::months(key.year, key.month, key.month))
    }

    pub fn is_all_years(&self) -> bool {
        self.year == Some(YearSelection::All)
    }

    /// Inclusive `[first instant of start month, last instant of end month]`.
    /// `None` when the window is incomplete, invalid, or the sentinel.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let Some(YearSelection::Year(year)) = self.year else {
            return None;
        };
        let start = MonthKey::new(year, self.start_month?)?.first_instant()?;
        let end = MonthKey::new(year, self.end_month?)?.last_instant()?;
        Some((start, end))
    }

    /// Final calendar month of the window, when it has one.
    pub fn end_key(&self) -> Option<MonthKey> {
        match self.year? {
            YearSelection::Year(year) => MonthKey::new(year, self.end_month?),
            YearSelection::All => None,
        }
    }

    pub fn describe(&self) -> String {
        match (self.year, self.start_month, self.end_month) {
            (Some(YearSelection::All), _, _) => "all years".to_string(),
            (Some(YearSelection::Year(y)), Some(s), Some(e)) => format!("{y}-{s:02}..{y}-{e:02}"),
            _ => "unset".to_string(),
        }
    }
}

/// Step one: keep tickets whose open timestamp parses and falls in the window.
pub fn filter_tickets<'a>(tickets: &'a [Ticket], window: &FilterWindow) -> Vec<&'a Ticket> {
    if window.is_all_years() {
        return tickets.iter().collect();
    }
    let Some((start, end)) = window.bounds() else {
        return Vec::new();
    };
    tickets
        .iter()
        .filter(|t| t.opened_at().is_some_and(|open| open >= start && open <= end))
        .collect()
}

/// Step two: does a month label survive the window? Windows without bounds
/// (sentinel or incomplete) let every month through.
pub fn month_in_window(month: MonthKey, window: &FilterWindow) -> bool {
    let Some((start, end)) = window.bounds() else {
        return true;
    };
    month
        .first_instant()
        .is_some_and(|first| first >= start && first <= end)
}

/// Distinct years with at least one datable ticket, ascending.
pub fn available_years(tickets: &[Ticket]) -> Vec<i32> {
    available_months(tickets)
        .into_iter()
        .map(|m| m.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct month keys with at least one datable ticket, ascending.
pub fn available_months(tickets: &[Ticket]) -> Vec<MonthKey> {
    tickets
        .iter()
        .filter_map(Ticket::open_month)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
