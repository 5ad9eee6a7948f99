//! The ticket record consumed by every analytics stage.
//!
//! Tickets arrive from the ticket source with raw timestamp strings.
//! Parsing happens here, lazily, and never fails loudly: a malformed
//! timestamp is indistinguishable from an absent one.

use crate::{
    classifier::RiskTier,
    types::{EntityId, MonthKey, UNASSIGNED_AGENT, UNKNOWN_CUSTOMER},
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Maximum number of sequential handling stages a ticket can carry.
pub const MAX_HANDLING_STAGES: usize = 5;

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a timestamp into local wall-clock time.
///
/// Accepts RFC 3339 (converted to the local zone), the ISO-like forms in
/// `DATETIME_FORMATS`, and a bare `YYYY-MM-DD` (midnight).
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_opt(raw: &Option<String>) -> Option<NaiveDateTime> {
    raw.as_deref().and_then(parse_timestamp)
}

fn is_blank(raw: &Option<String>) -> bool {
    raw.as_deref().map_or(true, |s| s.trim().is_empty())
}

// ── Status ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    Closed,
    Escalated,
    Unknown,
}

impl TicketStatus {
    pub fn normalize(raw: &str) -> Self {
        let s = raw.trim().to_lowercase();
        match s.as_str() {
            "open" | "open ticket" => Self::Open,
            "closed" | "close" | "close ticket" => Self::Closed,
            _ if s.contains("escalat") => Self::Escalated,
            _ => Self::Unknown,
        }
    }
}

// ── Ticket ──────────────────────────────────────────────────────────

/// One handling stage: free-text note plus the time it was closed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HandlingStage {
    #[serde(default)]
    pub note:      Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
}

impl HandlingStage {
    /// A stage exists once it has either a note or a close time.
    pub fn is_present(&self) -> bool {
        !is_blank(&self.note) || !is_blank(&self.closed_at)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub ticket_id:                String,
    #[serde(default)]
    pub customer_id:              Option<String>,
    #[serde(default)]
    pub customer_name:            Option<String>,
    #[serde(default)]
    pub open_by:                  Option<String>,
    #[serde(default)]
    pub category:                 Option<String>,
    #[serde(default)]
    pub classification:           Option<String>,
    #[serde(default)]
    pub sub_classification:       Option<String>,
    #[serde(default)]
    pub status:                   String,
    #[serde(default)]
    pub open_time:                Option<String>,
    #[serde(default)]
    pub close_time:               Option<String>,
    /// Close time of the first handling stage; drives first-response time.
    #[serde(default)]
    pub first_handling_closed_at: Option<String>,
    /// Sequential handling stages, first stage at index 0.
    #[serde(default)]
    pub handlings:                Vec<HandlingStage>,
    /// Statistical repeat-complainer tier, attached by the classifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_class:             Option<RiskTier>,
}

impl Ticket {
    pub fn opened_at(&self) -> Option<NaiveDateTime> {
        parse_opt(&self.open_time)
    }

    pub fn closed_at(&self) -> Option<NaiveDateTime> {
        parse_opt(&self.close_time)
    }

    pub fn first_handling_closed(&self) -> Option<NaiveDateTime> {
        parse_opt(&self.first_handling_closed_at)
    }

    /// Calendar month of the open timestamp, if it parses.
    pub fn open_month(&self) -> Option<MonthKey> {
        self.opened_at().map(|t| MonthKey::of(&t))
    }

    pub fn customer_key(&self) -> EntityId {
        non_blank(&self.customer_id).unwrap_or(UNKNOWN_CUSTOMER).to_string()
    }

    pub fn agent_key(&self) -> EntityId {
        non_blank(&self.open_by).unwrap_or(UNASSIGNED_AGENT).to_string()
    }

    pub fn normalized_status(&self) -> TicketStatus {
        TicketStatus::normalize(&self.status)
    }

    /// Stage `index` (0-based) if it exists and carries data.
    pub fn handling(&self, index: usize) -> Option<&HandlingStage> {
        self.handlings
            .get(index)
            .filter(|_| index < MAX_HANDLING_STAGES)
            .filter(|stage| stage.is_present())
    }

    /// Open and never closed: counts toward an agent's backlog.
    pub fn is_backlog(&self) -> bool {
        self.normalized_status() == TicketStatus::Open && self.closed_at().is_none()
    }
}

fn non_blank(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timestamp_shapes() {
        for raw in [
            "2024-03-05 08:30:00",
            "2024-03-05 08:30",
            "2024-03-05T08:30:00",
            "05/03/2024 08:30",
        ] {
            let parsed = parse_timestamp(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(parsed.to_string(), "2024-03-05 08:30:00", "input {raw}");
        }
        assert_eq!(
            parse_timestamp("2024-03-05").unwrap().to_string(),
            "2024-03-05 00:00:00"
        );
    }

    #[test]
    fn parses_seconds_and_fractions() {
        assert_eq!(
            parse_timestamp("05/03/2024 08:30:45").unwrap().to_string(),
            "2024-03-05 08:30:45"
        );
        for raw in ["2024-03-05 08:30:00.250", "2024-03-05T08:30:00.250"] {
            let parsed = parse_timestamp(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(parsed.to_string(), "2024-03-05 08:30:00.250", "input {raw}");
        }
        assert_eq!(
            parse_timestamp("2024-03-05T08:30").unwrap().to_string(),
            "2024-03-05 08:30:00"
        );
    }

    /// Offset-carrying input lands in local wall time, whatever zone the host is in.
    #[test]
    fn rfc3339_converts_to_local_time() {
        for raw in [
            "2024-03-05T08:30:00+02:00",
            "2024-03-05T08:30:00Z",
            "2024-03-05T08:30:00.250-05:00",
        ] {
            let expected = DateTime::parse_from_rfc3339(raw)
                .unwrap()
                .with_timezone(&Local)
                .naive_local();
            assert_eq!(parse_timestamp(raw), Some(expected), "input {raw}");
        }
        // Same instant, different offsets: same local time.
        assert_eq!(
            parse_timestamp("2024-03-05T10:30:00+02:00"),
            parse_timestamp("2024-03-05T08:30:00Z")
        );
    }

    #[test]
    fn garbage_and_blank_timestamps_are_none() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("   ").is_none());
        assert!(parse_timestamp("not a date").is_none());
        assert!(parse_timestamp("2024-13-40 10:00").is_none());
    }

    #[test]
    fn status_normalization() {
        assert_eq!(TicketStatus::normalize(" Open Ticket "), TicketStatus::Open);
        assert_eq!(TicketStatus::normalize("CLOSE TICKET"), TicketStatus::Closed);
        assert_eq!(TicketStatus::normalize("Escalated L2"), TicketStatus::Escalated);
        assert_eq!(TicketStatus::normalize("pending"), TicketStatus::Unknown);
    }

    #[test]
    fn blank_ids_fall_back_to_placeholders() {
        let t = Ticket {
            customer_id: Some("  ".into()),
            ..Ticket::default()
        };
        assert_eq!(t.customer_key(), UNKNOWN_CUSTOMER);
        assert_eq!(t.agent_key(), UNASSIGNED_AGENT);
    }
}
