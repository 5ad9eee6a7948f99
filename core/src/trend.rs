//! Trend engine: direction and size of the latest move in a series,
//! plus the fixed insight copy for each metric and direction.

use serde::{Deserialize, Serialize};

/// Moves smaller than this are flat.
pub const TREND_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    TicketVolume,
    FirstResponse,
    Resolution,
    Fcr,
    Sla,
    Backlog,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        Self::TicketVolume,
        Self::FirstResponse,
        Self::Resolution,
        Self::Fcr,
        Self::Sla,
        Self::Backlog,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub direction:  TrendDirection,
    /// Last point minus the one before it; 0 with fewer than two points.
    pub delta:      f64,
    /// `delta` relative to the previous point, in percent; 0 when that point is 0.
    pub pct_change: f64,
}

impl Trend {
    pub const FLAT: Trend = Trend {
        direction:  TrendDirection::Flat,
        delta:      0.0,
        pct_change: 0.0,
    };
}

pub fn trend_of(series: &[f64]) -> Trend {
    trend_of_with_epsilon(series, TREND_EPSILON)
}

pub fn trend_of_with_epsilon(series: &[f64], epsilon: f64) -> Trend {
    let [.., prev, last] = series else {
        return Trend::FLAT;
    };
    let delta = last - prev;
    // Bad points never signal a move.
    if !delta.is_finite() {
        return Trend::FLAT;
    }
    let pct_change = if *prev == 0.0 { 0.0 } else { delta / prev * 100.0 };
    let direction = if delta.abs() < epsilon {
        TrendDirection::Flat
    } else if last > prev {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };
    Trend { direction, delta, pct_change }
}

// ── Insights ────────────────────────────────────────────────────────

/// Copy per metric, ordered [up, down, flat].
const INSIGHTS: [(MetricKind, [&str; 3]); 6] = [
    (MetricKind::TicketVolume, [
        "Ticket volume is rising; check staffing against the incoming load.",
        "Ticket volume is falling; fewer customers are reaching the desk.",
        "Ticket volume is steady month over month.",
    ]),
    (MetricKind::FirstResponse, [
        "First response is getting slower; customers wait longer for a first touch.",
        "First response is getting faster; customers are picked up sooner.",
        "First response time is holding steady.",
    ]),
    (MetricKind::Resolution, [
        "Resolution time is increasing; tickets stay open longer.",
        "Resolution time is decreasing; tickets are closed sooner.",
        "Resolution time is holding steady.",
    ]),
    (MetricKind::Fcr, [
        "First-contact resolution is improving; fewer tickets need a second stage.",
        "First-contact resolution is slipping; more tickets need escalation.",
        "First-contact resolution is stable.",
    ]),
    (MetricKind::Sla, [
        "SLA compliance is improving; more tickets close within 24 hours.",
        "SLA compliance is dropping; more tickets miss the 24-hour target.",
        "SLA compliance is stable.",
    ]),
    (MetricKind::Backlog, [
        "Backlog is growing; open tickets are piling up.",
        "Backlog is shrinking; open tickets are being cleared.",
        "Backlog is unchanged.",
    ]),
];

pub fn insight_for(kind: MetricKind, direction: TrendDirection) -> &'static str {
    let slot = match direction {
        TrendDirection::Up   => 0,
        TrendDirection::Down => 1,
        TrendDirection::Flat => 2,
    };
    INSIGHTS
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or("", |(_, texts)| texts[slot])
}

/// A metric's trend paired with its insight copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendInsight {
    pub metric: MetricKind,
    #[serde(flatten)]
    pub trend:  Trend,
    pub text:   &'static str,
}

impl TrendInsight {
    pub fn of(metric: MetricKind, series: &[f64], epsilon: f64) -> Self {
        let trend = trend_of_with_epsilon(series, epsilon);
        Self {
            metric,
            trend,
            text: insight_for(metric, trend.direction),
        }
    }
}
