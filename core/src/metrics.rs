//! Per-ticket metric extraction.
//!
//! Pure functions of a single ticket. Never fails: a missing or malformed
//! timestamp zeroes the metric it feeds, and negative spans clamp to zero.

use crate::{
    ticket::{Ticket, MAX_HANDLING_STAGES},
    types::EntityId,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Default SLA threshold: one day, in minutes.
pub const SLA_THRESHOLD_MINUTES: f64 = 1440.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetricSet {
    pub first_response_minutes: f64,
    pub resolution_minutes:     f64,
    pub first_contact_resolved: bool,
    pub sla_compliant:          bool,
}

impl DerivedMetricSet {
    pub fn from_ticket(ticket: &Ticket) -> Self {
        Self::from_ticket_with(ticket, SLA_THRESHOLD_MINUTES)
    }

    pub fn from_ticket_with(ticket: &Ticket, sla_threshold_minutes: f64) -> Self {
        let opened = ticket.opened_at();
        let first_response_minutes = span_minutes(opened, ticket.first_handling_closed());
        let resolution_minutes = span_minutes(opened, ticket.closed_at());

        Self {
            first_response_minutes,
            resolution_minutes,
            first_contact_resolved: ticket.handling(1).is_none(),
            sla_compliant: resolution_minutes > 0.0 && resolution_minutes <= sla_threshold_minutes,
        }
    }

    /// FCR flag as a 0/100 sample for rate averaging.
    pub fn fcr_sample(&self) -> f64 {
        if self.first_contact_resolved { 100.0 } else { 0.0 }
    }

    pub fn sla_sample(&self) -> f64 {
        if self.sla_compliant { 100.0 } else { 0.0 }
    }
}

fn span_minutes(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) => {
            let millis = (to - from).num_milliseconds() as f64;
            (millis / 60_000.0).max(0.0)
        }
        _ => 0.0,
    }
}

// ── Escalation depth ────────────────────────────────────────────────

/// 1 for a ticket handled in one stage, up to 5 for the deepest escalation.
pub fn escalation_level(ticket: &Ticket) -> u8 {
    (1..MAX_HANDLING_STAGES)
        .rev()
        .find(|&i| ticket.handling(i).is_some())
        .map_or(1, |i| (i + 1) as u8)
}

/// Ticket counts per escalation level for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationDepth {
    pub agent:  EntityId,
    /// Index 0 is level 1 (no escalation), index 4 is level 5.
    pub levels: [u32; MAX_HANDLING_STAGES],
}

impl EscalationDepth {
    pub fn for_agent<'a>(agent: &str, tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut levels = [0u32; MAX_HANDLING_STAGES];
        for ticket in tickets.into_iter().filter(|t| t.agent_key() == agent) {
            levels[(escalation_level(ticket) - 1) as usize] += 1;
        }
        Self {
            agent: agent.to_string(),
            levels,
        }
    }

    /// Tickets that needed at least a second stage.
    pub fn escalated(&self) -> u32 {
        self.levels[1..].iter().sum()
    }
}
