//! Customer risk classifier.
//!
//! Two strategies coexist behind `ClassifierStrategy`:
//!   - Fixed thresholds   → per-window customer cards (`classify_customers`).
//!   - Statistical (μ, σ) → repeat-complainer tagging over whatever
//!                          population the caller passes
//!                          (`classify_customers_statistical`).
//! Results differ with the population; the engine uses the full batch for
//! the statistical pass and the filtered window for the fixed one.

use crate::{
    config::{AnalyticsConfig, RiskThresholds},
    ticket::Ticket,
    types::{EntityId, MonthKey},
    window::{filter_tickets, FilterWindow},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Normal,
    Persistent,
    Chronic,
    Extreme,
}

impl RiskTier {
    pub const ALL: [RiskTier; 4] = [Self::Normal, Self::Persistent, Self::Chronic, Self::Extreme];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal     => "Normal",
            Self::Persistent => "Persistent",
            Self::Chronic    => "Chronic",
            Self::Extreme    => "Extreme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerTrend {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerAggregate {
    pub customer_id:   EntityId,
    pub customer_name: Option<String>,
    pub ticket_count:  u32,
    pub risk_tier:     RiskTier,
    pub trend:         CustomerTrend,
}

/// Which classification rule to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierStrategy {
    Fixed(RiskThresholds),
    /// Mean / population standard deviation of the given counts.
    Statistical,
}

impl ClassifierStrategy {
    /// Classify every count in `counts`, keyed as given.
    pub fn classify_all(&self, counts: &BTreeMap<EntityId, u32>) -> BTreeMap<EntityId, RiskTier> {
        match self {
            Self::Fixed(thresholds) => counts
                .iter()
                .map(|(id, &n)| (id.clone(), classify_fixed(n, thresholds)))
                .collect(),
            Self::Statistical => {
                let stats = PopulationStats::from_counts(counts.values().copied());
                counts
                    .iter()
                    .map(|(id, &n)| (id.clone(), stats.classify(n)))
                    .collect()
            }
        }
    }
}

// ── Fixed thresholds ─────────────────────────────────────────────────────────

pub fn classify_fixed(count: u32, thresholds: &RiskThresholds) -> RiskTier {
    if count > thresholds.extreme_above {
        RiskTier::Extreme
    } else if count >= thresholds.chronic_min {
        RiskTier::Chronic
    } else if count >= thresholds.persistent_min {
        RiskTier::Persistent
    } else {
        RiskTier::Normal
    }
}

// ── Statistical ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub mean:    f64,
    /// Population (not sample) standard deviation.
    pub std_dev: f64,
}

impl PopulationStats {
    pub fn from_counts(counts: impl IntoIterator<Item = u32>) -> Self {
        let counts: Vec<f64> = counts.into_iter().map(f64::from).collect();
        if counts.is_empty() {
            return Self::default();
        }
        let n = counts.len() as f64;
        let mean = counts.iter().sum::<f64>() / n;
        let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
        Self {
            mean,
            std_dev: variance.sqrt(),
        }
    }

    pub fn classify(&self, count: u32) -> RiskTier {
        let c = f64::from(count);
        if c <= self.mean {
            RiskTier::Normal
        } else if c <= self.mean + self.std_dev {
            RiskTier::Persistent
        } else if c <= self.mean + 2.0 * self.std_dev {
            RiskTier::Chronic
        } else {
            RiskTier::Extreme
        }
    }
}

/// Ticket counts per customer, over the tickets given.
pub fn customer_counts<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> BTreeMap<EntityId, u32> {
    let mut counts = BTreeMap::new();
    for ticket in tickets {
        *counts.entry(ticket.customer_key()).or_insert(0) += 1;
    }
    counts
}

/// Statistical tier per customer over the whole batch given.
pub fn classify_customers_statistical(tickets: &[Ticket]) -> BTreeMap<EntityId, RiskTier> {
    ClassifierStrategy::Statistical.classify_all(&customer_counts(tickets))
}

/// Attach each ticket's customer tier. Customers absent from `tiers` get Normal.
pub fn tag_repeat_class(tickets: &mut [Ticket], tiers: &BTreeMap<EntityId, RiskTier>) {
    for ticket in tickets.iter_mut() {
        let tier = tiers
            .get(&ticket.customer_key())
            .copied()
            .unwrap_or(RiskTier::Normal);
        ticket.repeat_class = Some(tier);
    }
}

// ── Per-window customer cards ────────────────────────────────────────────────

pub fn classify_customers(tickets: &[Ticket], window: &FilterWindow) -> Vec<CustomerAggregate> {
    classify_customers_with(tickets, window, &AnalyticsConfig::default())
}

pub fn classify_customers_with(
    tickets: &[Ticket],
    window: &FilterWindow,
    config: &AnalyticsConfig,
) -> Vec<CustomerAggregate> {
    let filtered = filter_tickets(tickets, window);
    aggregate_customers(
        &filtered,
        trend_month(window, &filtered),
        &ClassifierStrategy::Fixed(config.risk_thresholds.clone()),
    )
}

/// Customer cards over an already filtered subset, in first-appearance order.
/// `strategy` sees only this subset's counts.
pub fn aggregate_customers(
    filtered: &[&Ticket],
    final_month: Option<MonthKey>,
    strategy: &ClassifierStrategy,
) -> Vec<CustomerAggregate> {
    let mut order: Vec<EntityId> = Vec::new();
    let mut groups: HashMap<EntityId, Vec<&Ticket>> = HashMap::new();
    for &ticket in filtered {
        let key = ticket.customer_key();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(ticket);
    }

    let counts: BTreeMap<EntityId, u32> = groups
        .iter()
        .map(|(id, tickets)| (id.clone(), tickets.len() as u32))
        .collect();
    let tiers = strategy.classify_all(&counts);

    order
        .into_iter()
        .filter_map(|customer_id| {
            let tickets = groups.remove(&customer_id)?;
            let ticket_count = tickets.len() as u32;
            Some(CustomerAggregate {
                customer_name: tickets.iter().find_map(|t| t.customer_name.clone()),
                risk_tier: tiers.get(&customer_id).copied().unwrap_or(RiskTier::Normal),
                trend: customer_trend(&tickets, final_month),
                customer_id,
                ticket_count,
            })
        })
        .collect()
}

/// Final month of the window. Under the all-years sentinel, the latest
/// month present in the subset stands in.
pub fn trend_month(window: &FilterWindow, filtered: &[&Ticket]) -> Option<MonthKey> {
    if window.is_all_years() {
        filtered.iter().filter_map(|t| t.open_month()).max()
    } else {
        window.end_key()
    }
}

/// Final month versus the month before it, both counted from `tickets`.
pub fn customer_trend(tickets: &[&Ticket], final_month: Option<MonthKey>) -> CustomerTrend {
    let Some(last) = final_month else {
        return CustomerTrend::Stable;
    };
    let prev = last.pred();
    let count_in = |month: MonthKey| tickets.iter().filter(|t| t.open_month() == Some(month)).count();

    let (this_month, prev_month) = (count_in(last), count_in(prev));
    if this_month > prev_month {
        CustomerTrend::Up
    } else if this_month < prev_month {
        CustomerTrend::Down
    } else {
        CustomerTrend::Stable
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total:      u32,
    pub normal:     u32,
    pub persistent: u32,
    pub chronic:    u32,
    pub extreme:    u32,
}

impl RiskSummary {
    pub fn from_aggregates(aggregates: &[CustomerAggregate]) -> Self {
        let mut summary = Self::default();
        for agg in aggregates {
            summary.total += 1;
            match agg.risk_tier {
                RiskTier::Normal     => summary.normal += 1,
                RiskTier::Persistent => summary.persistent += 1,
                RiskTier::Chronic    => summary.chronic += 1,
                RiskTier::Extreme    => summary.extreme += 1,
            }
        }
        summary
    }

    pub fn count(&self, tier: RiskTier) -> u32 {
        match tier {
            RiskTier::Normal     => self.normal,
            RiskTier::Persistent => self.persistent,
            RiskTier::Chronic    => self.chronic,
            RiskTier::Extreme    => self.extreme,
        }
    }
}
