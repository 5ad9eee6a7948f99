//! Monthly bucketer: groups per-ticket metrics by (entity, calendar month).
//!
//! Produces label/data arrays aligned across all entities for charting:
//!   - labels are the months present in the filtered batch, ascending,
//!     re-filtered against the window (see `window::month_in_window`);
//!   - entities keep the order of their first datable ticket;
//!   - a cell with no tickets is all zeros, never absent.
//!
//! Scalar metrics (response, resolution, FCR, SLA) are means over the cell;
//! volume and backlog are sums.

use crate::{
    metrics::{DerivedMetricSet, SLA_THRESHOLD_MINUTES},
    ticket::Ticket,
    trend::MetricKind,
    types::{EntityId, MonthKey},
    window::{filter_tickets, month_in_window, FilterWindow},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Agent,
    Customer,
}

impl GroupKey {
    pub fn key_of(&self, ticket: &Ticket) -> EntityId {
        match self {
            Self::Agent    => ticket.agent_key(),
            Self::Customer => ticket.customer_key(),
        }
    }
}

/// Aggregated metrics of one (entity, month) cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyMetrics {
    pub volume:                      u32,
    pub backlog:                     u32,
    pub mean_first_response_minutes: f64,
    pub mean_resolution_minutes:     f64,
    /// Percent of tickets resolved on first contact (0–100).
    pub fcr_rate:                    f64,
    /// Percent of tickets resolved within the SLA threshold (0–100).
    pub sla_rate:                    f64,
}

impl MonthlyMetrics {
    pub fn value(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::TicketVolume  => f64::from(self.volume),
            MetricKind::FirstResponse => self.mean_first_response_minutes,
            MetricKind::Resolution    => self.mean_resolution_minutes,
            MetricKind::Fcr           => self.fcr_rate,
            MetricKind::Sla           => self.sla_rate,
            MetricKind::Backlog       => f64::from(self.backlog),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMonthlyBucket {
    pub agent:       EntityId,
    pub month:       MonthKey,
    #[serde(flatten)]
    pub metrics:     MonthlyMetrics,
}

/// One entity's row: a typed month → metrics map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySeries {
    pub entity: EntityId,
    #[serde(with = "crate::types::month_map")]
    pub months: BTreeMap<MonthKey, MonthlyMetrics>,
}

impl EntitySeries {
    /// Metrics for `month`; zeros when the entity had no tickets then.
    pub fn cell(&self, month: MonthKey) -> MonthlyMetrics {
        self.months.get(&month).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    pub group:    GroupKey,
    pub labels:   Vec<MonthKey>,
    pub entities: Vec<EntitySeries>,
    /// All entities combined, aligned with `labels`.
    pub totals:   Vec<MonthlyMetrics>,
    /// Tickets handed to the bucketer, datable or not.
    pub raw_total: usize,
    /// Tickets skipped because their open timestamp did not parse.
    pub undated:  usize,
}

impl MonthlySeries {
    pub fn entity(&self, entity: &str) -> Option<&EntitySeries> {
        self.entities.iter().find(|e| e.entity == entity)
    }

    /// `kind` for one entity, aligned with `labels`. Empty for unknown entities.
    pub fn series(&self, entity: &str, kind: MetricKind) -> Vec<f64> {
        self.entity(entity)
            .map(|e| self.labels.iter().map(|&m| e.cell(m).value(kind)).collect())
            .unwrap_or_default()
    }

    /// `kind` for all entities combined, aligned with `labels`.
    pub fn org_series(&self, kind: MetricKind) -> Vec<f64> {
        self.totals.iter().map(|t| t.value(kind)).collect()
    }

    pub fn totals_per_month(&self) -> Vec<u32> {
        self.totals.iter().map(|t| t.volume).collect()
    }

    pub fn label_strings(&self) -> Vec<String> {
        self.labels.iter().map(|m| m.label()).collect()
    }

    /// Flatten into one bucket per (entity, label month), zero cells included.
    pub fn buckets(&self) -> Vec<AgentMonthlyBucket> {
        self.entities
            .iter()
            .flat_map(|e| {
                self.labels.iter().map(move |&month| AgentMonthlyBucket {
                    agent: e.entity.clone(),
                    month,
                    metrics: e.cell(month),
                })
            })
            .collect()
    }
}

// ── Accumulation ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct CellAccumulator {
    volume:  u32,
    backlog: u32,
    frt_sum: f64,
    art_sum: f64,
    fcr_sum: f64,
    sla_sum: f64,
}

impl CellAccumulator {
    fn add(&mut self, metrics: &DerivedMetricSet, backlog: bool) {
        self.volume += 1;
        if backlog {
            self.backlog += 1;
        }
        self.frt_sum += metrics.first_response_minutes;
        self.art_sum += metrics.resolution_minutes;
        self.fcr_sum += metrics.fcr_sample();
        self.sla_sum += metrics.sla_sample();
    }

    fn finish(&self) -> MonthlyMetrics {
        if self.volume == 0 {
            return MonthlyMetrics::default();
        }
        let n = f64::from(self.volume);
        MonthlyMetrics {
            volume:                      self.volume,
            backlog:                     self.backlog,
            mean_first_response_minutes: self.frt_sum / n,
            mean_resolution_minutes:     self.art_sum / n,
            fcr_rate:                    self.fcr_sum / n,
            sla_rate:                    self.sla_sum / n,
        }
    }
}

/// Bucket an already filtered subset. `window` drives the month-label filter.
pub fn build_monthly_series(
    filtered: &[&Ticket],
    group: GroupKey,
    window: &FilterWindow,
    sla_threshold_minutes: f64,
) -> MonthlySeries {
    let mut entity_order: Vec<EntityId> = Vec::new();
    let mut cells: HashMap<EntityId, BTreeMap<MonthKey, CellAccumulator>> = HashMap::new();
    let mut org: BTreeMap<MonthKey, CellAccumulator> = BTreeMap::new();
    let mut months: BTreeSet<MonthKey> = BTreeSet::new();
    let mut undated = 0usize;

    for &ticket in filtered {
        let Some(month) = ticket.open_month() else {
            undated += 1;
            continue;
        };
        let metrics = DerivedMetricSet::from_ticket_with(ticket, sla_threshold_minutes);
        let backlog = ticket.is_backlog();
        let entity = group.key_of(ticket);

        months.insert(month);
        org.entry(month).or_default().add(&metrics, backlog);
        cells
            .entry(entity.clone())
            .or_insert_with(|| {
                entity_order.push(entity);
                BTreeMap::new()
            })
            .entry(month)
            .or_default()
            .add(&metrics, backlog);
    }

    if undated > 0 {
        log::warn!("{undated} ticket(s) without a parseable open time left out of monthly buckets");
    }

    // BTreeSet iteration is already chronological.
    let labels: Vec<MonthKey> = months
        .into_iter()
        .filter(|&m| month_in_window(m, window))
        .collect();

    let entities = entity_order
        .into_iter()
        .map(|entity| {
            let months = cells
                .remove(&entity)
                .unwrap_or_default()
                .into_iter()
                .filter(|(m, _)| labels.contains(m))
                .map(|(m, acc)| (m, acc.finish()))
                .collect();
            EntitySeries { entity, months }
        })
        .collect();

    let totals = labels
        .iter()
        .map(|m| org.get(m).map(CellAccumulator::finish).unwrap_or_default())
        .collect();

    log::debug!(
        "bucketed {} ticket(s) into {} month(s) for {:?}",
        filtered.len() - undated,
        labels.len(),
        group
    );

    MonthlySeries {
        group,
        labels,
        entities,
        totals,
        raw_total: filtered.len(),
        undated,
    }
}

/// Filter by window, then bucket per agent.
pub fn agent_monthly_series(tickets: &[Ticket], window: &FilterWindow) -> MonthlySeries {
    let filtered = filter_tickets(tickets, window);
    build_monthly_series(&filtered, GroupKey::Agent, window, SLA_THRESHOLD_MINUTES)
}

pub fn build_agent_monthly_buckets(tickets: &[Ticket], window: &FilterWindow) -> Vec<AgentMonthlyBucket> {
    agent_monthly_series(tickets, window).buckets()
}
