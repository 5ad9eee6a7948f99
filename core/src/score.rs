//! Agent score calculator.
//!
//! Six KPI components, each normalized against its target and clamped to
//! [0, cap] (cap = 120 by default), blended by fixed weights and rounded.
//!
//! The composite is NOT clamped again after weighting: an agent beating
//! every target legitimately scores above 100.

use crate::{
    bucketer::{AgentMonthlyBucket, MonthlyMetrics, MonthlySeries},
    config::{AnalyticsConfig, GradeBands, ScoreConfig},
    metrics::DerivedMetricSet,
    ticket::Ticket,
    types::EntityId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub fcr:        f64,
    pub sla:        f64,
    pub response:   f64,
    pub resolution: f64,
    pub backlog:    f64,
    pub volume:     f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    pub agent:      EntityId,
    pub composite:  i64,
    pub components: ScoreComponents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreGrade {
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl ScoreGrade {
    pub fn from_composite(composite: i64, bands: &GradeBands) -> Self {
        let c = composite as f64;
        if c >= bands.platinum {
            Self::Platinum
        } else if c >= bands.gold {
            Self::Gold
        } else if c >= bands.silver {
            Self::Silver
        } else {
            Self::Bronze
        }
    }
}

// ── Components ───────────────────────────────────────────────────────────────

fn clamp_component(value: f64, cap: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, cap)
    } else {
        0.0
    }
}

/// Higher-is-better: `actual / target × 100`.
fn rate_component(actual: f64, target: f64, cap: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    clamp_component(actual / target * 100.0, cap)
}

/// Lower-is-better: `target / actual × 100`. No data (0) scores 0.
fn inverse_component(actual: f64, target: f64, cap: f64) -> f64 {
    if actual <= 0.0 || !actual.is_finite() {
        return 0.0;
    }
    clamp_component(target / actual * 100.0, cap)
}

fn backlog_component(backlog: u32, config: &ScoreConfig) -> f64 {
    if backlog == 0 {
        100.0
    } else if backlog <= config.backlog_cutoff {
        (100.0 - f64::from(backlog) * config.backlog_penalty_per_ticket).max(0.0)
    } else {
        0.0
    }
}

fn volume_component(volume: u32, max_volume: u32, cap: f64) -> f64 {
    if max_volume == 0 {
        return 100.0;
    }
    clamp_component(f64::from(volume) / f64::from(max_volume) * 100.0, cap)
}

impl ScoreComponents {
    pub fn compute(metrics: &MonthlyMetrics, max_volume: u32, config: &ScoreConfig) -> Self {
        let cap = config.component_cap;
        Self {
            fcr:        rate_component(metrics.fcr_rate, config.fcr_target_rate, cap),
            sla:        rate_component(metrics.sla_rate, config.sla_target_rate, cap),
            response:   inverse_component(metrics.mean_first_response_minutes, config.response_target_minutes, cap),
            resolution: inverse_component(metrics.mean_resolution_minutes, config.resolution_target_minutes, cap),
            backlog:    backlog_component(metrics.backlog, config),
            volume:     volume_component(metrics.volume, max_volume, cap),
        }
    }

    /// Exact weighted sum, before rounding.
    pub fn weighted(&self, config: &ScoreConfig) -> f64 {
        let w = &config.weights;
        w.fcr * self.fcr
            + w.sla * self.sla
            + w.response * self.response
            + w.resolution * self.resolution
            + w.backlog * self.backlog
            + w.volume * self.volume
    }
}

// ── Scoring ──────────────────────────────────────────────────────────────────

pub fn score_agent(bucket: &AgentMonthlyBucket, max_volume_in_scope: u32) -> AgentScore {
    score_metrics(&bucket.agent, &bucket.metrics, max_volume_in_scope, &ScoreConfig::default())
}

pub fn score_metrics(
    agent: &str,
    metrics: &MonthlyMetrics,
    max_volume_in_scope: u32,
    config: &ScoreConfig,
) -> AgentScore {
    let components = ScoreComponents::compute(metrics, max_volume_in_scope, config);
    AgentScore {
        agent: agent.to_string(),
        composite: components.weighted(config).round() as i64,
        components,
    }
}

/// Descending by composite; ties keep their incoming order.
pub fn rank_agents(mut scores: Vec<AgentScore>) -> Vec<AgentScore> {
    scores.sort_by(|a, b| b.composite.cmp(&a.composite));
    scores
}

// ── Window-level metrics ─────────────────────────────────────────────────────

/// Per-agent metrics over a whole window, in first-appearance order.
///
/// Unlike the monthly bucketer, undated tickets still count here: the window
/// filter has already decided membership.
pub fn window_metrics(filtered: &[&Ticket], sla_threshold_minutes: f64) -> Vec<(EntityId, MonthlyMetrics)> {
    let mut order: Vec<EntityId> = Vec::new();
    let mut groups: HashMap<EntityId, Vec<DerivedMetricSet>> = HashMap::new();
    let mut backlogs: HashMap<EntityId, u32> = HashMap::new();

    for &ticket in filtered {
        let agent = ticket.agent_key();
        if ticket.is_backlog() {
            *backlogs.entry(agent.clone()).or_insert(0) += 1;
        }
        groups
            .entry(agent.clone())
            .or_insert_with(|| {
                order.push(agent);
                Vec::new()
            })
            .push(DerivedMetricSet::from_ticket_with(ticket, sla_threshold_minutes));
    }

    order
        .into_iter()
        .map(|agent| {
            let samples = groups.remove(&agent).unwrap_or_default();
            let n = samples.len() as f64;
            let mean = |f: fn(&DerivedMetricSet) -> f64| {
                if samples.is_empty() { 0.0 } else { samples.iter().map(f).sum::<f64>() / n }
            };
            let metrics = MonthlyMetrics {
                volume:                      samples.len() as u32,
                backlog:                     backlogs.get(&agent).copied().unwrap_or(0),
                mean_first_response_minutes: mean(|m| m.first_response_minutes),
                mean_resolution_minutes:     mean(|m| m.resolution_minutes),
                fcr_rate:                    mean(DerivedMetricSet::fcr_sample),
                sla_rate:                    mean(DerivedMetricSet::sla_sample),
            };
            (agent, metrics)
        })
        .collect()
}

/// Score every agent over the window, ranked.
pub fn score_window(filtered: &[&Ticket], config: &AnalyticsConfig) -> Vec<AgentScore> {
    let per_agent = window_metrics(filtered, config.sla_threshold_minutes);
    score_all(&per_agent, &config.score)
}

/// Score agents against the busiest of them, ranked.
pub fn score_all(per_agent: &[(EntityId, MonthlyMetrics)], config: &ScoreConfig) -> Vec<AgentScore> {
    let max_volume = per_agent.iter().map(|(_, m)| m.volume).max().unwrap_or(0);
    let scores = per_agent
        .iter()
        .map(|(agent, metrics)| score_metrics(agent, metrics, max_volume, config))
        .collect();
    rank_agents(scores)
}

// ── Monthly scores ───────────────────────────────────────────────────────────

/// One agent's composite per month label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScoreSeries {
    pub agent:  EntityId,
    pub scores: Vec<i64>,
}

/// Composite per (agent, month); volume normalized against that month's busiest agent.
pub fn monthly_scores(series: &MonthlySeries, config: &ScoreConfig) -> Vec<AgentScoreSeries> {
    let max_per_month: Vec<u32> = series
        .labels
        .iter()
        .map(|&m| series.entities.iter().map(|e| e.cell(m).volume).max().unwrap_or(0))
        .collect();

    series
        .entities
        .iter()
        .map(|e| AgentScoreSeries {
            agent:  e.entity.clone(),
            scores: series
                .labels
                .iter()
                .zip(&max_per_month)
                .map(|(&m, &max)| score_metrics(&e.entity, &e.cell(m), max, config).composite)
                .collect(),
        })
        .collect()
}

// ── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSummary {
    pub total_agents:     usize,
    pub busiest_agent:    Option<EntityId>,
    pub top_scorer:       Option<EntityId>,
    pub fastest_resolver: Option<EntityId>,
}

impl AgentSummary {
    /// `ranked` must come from `rank_agents`; `per_agent` from `window_metrics`.
    pub fn build(ranked: &[AgentScore], per_agent: &[(EntityId, MonthlyMetrics)]) -> Self {
        let mut busiest: Option<(&EntityId, u32)> = None;
        let mut fastest: Option<(&EntityId, f64)> = None;
        for (agent, m) in per_agent {
            if busiest.map_or(true, |(_, v)| m.volume > v) {
                busiest = Some((agent, m.volume));
            }
            let art = m.mean_resolution_minutes;
            if art > 0.0 && fastest.map_or(true, |(_, best)| art < best) {
                fastest = Some((agent, art));
            }
        }
        Self {
            total_agents:     per_agent.len(),
            busiest_agent:    busiest.map(|(a, _)| a.clone()),
            top_scorer:       ranked.first().map(|s| s.agent.clone()),
            fastest_resolver: fastest.map(|(a, _)| a.clone()),
        }
    }
}
