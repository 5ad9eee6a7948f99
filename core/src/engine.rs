//! The analytics engine: one full pass over a ticket batch.
//!
//! EXECUTION ORDER (fixed):
//!   1. Time-window filter
//!   2. Customer risk classifier (fixed thresholds, filtered window)
//!   3. Customer risk classifier (statistical, whole batch)
//!   4. Monthly bucketer (per agent, month-label filter applied)
//!   5. Agent score calculator (window level, then per month)
//!   6. Trend engine over the organisation-level monthly series
//!
//! RULES:
//!   - Every stage is a pure function of the batch, the window and the config.
//!   - The engine keeps no state between runs besides its config.
//!   - Nothing is cached; a new window means a new run.

use crate::{
    bucketer::{build_monthly_series, AgentMonthlyBucket, GroupKey, MonthlySeries},
    classifier::{
        aggregate_customers, classify_customers_statistical, trend_month, ClassifierStrategy,
        CustomerAggregate, RiskSummary, RiskTier,
    },
    config::AnalyticsConfig,
    metrics::EscalationDepth,
    score::{monthly_scores, score_all, window_metrics, AgentScore, AgentScoreSeries, AgentSummary, ScoreGrade},
    ticket::Ticket,
    trend::{MetricKind, TrendInsight},
    types::{EntityId, MonthKey},
    window::{filter_tickets, FilterWindow},
};
use serde::Serialize;
use std::collections::BTreeMap;

/// An agent's window score with its grade band.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradedScore {
    #[serde(flatten)]
    pub score: AgentScore,
    pub grade: ScoreGrade,
}

/// Everything one filter application produces. Owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub window:            FilterWindow,
    pub raw_ticket_count:  usize,
    pub filtered_count:    usize,
    pub customers:         Vec<CustomerAggregate>,
    pub risk_summary:      RiskSummary,
    pub repeat_tiers:      BTreeMap<EntityId, RiskTier>,
    pub months:            Vec<MonthKey>,
    pub month_labels:      Vec<String>,
    pub totals_per_month:  Vec<u32>,
    pub agent_buckets:     Vec<AgentMonthlyBucket>,
    pub agent_scores:      Vec<GradedScore>,
    pub agent_summary:     AgentSummary,
    /// Escalation levels per agent, in ranking order.
    pub escalation:        Vec<EscalationDepth>,
    pub monthly_scores:    Vec<AgentScoreSeries>,
    pub insights:          Vec<TrendInsight>,
}

impl AnalyticsReport {
    pub fn is_empty(&self) -> bool {
        self.filtered_count == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    pub config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Run every stage once over `tickets` for `window`.
    pub fn run(&self, tickets: &[Ticket], window: &FilterWindow) -> AnalyticsReport {
        let config = &self.config;

        // 1. Window
        let filtered = filter_tickets(tickets, window);
        log::debug!("window {}: {} of {} ticket(s)", window.describe(), filtered.len(), tickets.len());

        // 2–3. Customers
        let customers = aggregate_customers(
            &filtered,
            trend_month(window, &filtered),
            &ClassifierStrategy::Fixed(config.risk_thresholds.clone()),
        );
        let risk_summary = RiskSummary::from_aggregates(&customers);
        let repeat_tiers = classify_customers_statistical(tickets);

        // 4. Monthly buckets
        let series = build_monthly_series(
            &filtered,
            GroupKey::Agent,
            window,
            config.sla_threshold_minutes,
        );

        // 5. Scores
        let per_agent = window_metrics(&filtered, config.sla_threshold_minutes);
        let ranked = score_all(&per_agent, &config.score);
        let agent_summary = AgentSummary::build(&ranked, &per_agent);
        let escalation = ranked
            .iter()
            .map(|s| EscalationDepth::for_agent(&s.agent, filtered.iter().copied()))
            .collect();
        let agent_scores = ranked
            .into_iter()
            .map(|score| GradedScore {
                grade: ScoreGrade::from_composite(score.composite, &config.grade_bands),
                score,
            })
            .collect();
        let monthly = monthly_scores(&series, &config.score);

        // 6. Trends
        let insights = org_insights(&series, config.trend_epsilon);

        log::info!(
            "analytics pass: window={} tickets={} customers={} agents={} months={}",
            window.describe(),
            filtered.len(),
            customers.len(),
            agent_summary.total_agents,
            series.labels.len(),
        );

        AnalyticsReport {
            window: *window,
            raw_ticket_count: tickets.len(),
            filtered_count: filtered.len(),
            customers,
            risk_summary,
            repeat_tiers,
            month_labels: series.label_strings(),
            totals_per_month: series.totals_per_month(),
            agent_buckets: series.buckets(),
            months: series.labels,
            agent_scores,
            agent_summary,
            escalation,
            monthly_scores: monthly,
            insights,
        }
    }
}

/// One insight per metric over the organisation-level monthly series.
pub fn org_insights(series: &MonthlySeries, epsilon: f64) -> Vec<TrendInsight> {
    MetricKind::ALL
        .iter()
        .map(|&kind| TrendInsight::of(kind, &series.org_series(kind), epsilon))
        .collect()
}
