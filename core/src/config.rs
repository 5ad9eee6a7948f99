//! Tunable constants for classification, scoring and trend detection.
//!
//! Every threshold the analytics stages consult lives here so it can be
//! tuned from a JSON file without touching classification logic.
//! In tests, use `AnalyticsConfig::default()`.

use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

// ── Risk classification ─────────────────────────────────────────────

/// Fixed-threshold customer risk bands, by ticket count in the window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskThresholds {
    /// Lowest count classified Persistent.
    pub persistent_min: u32,
    /// Lowest count classified Chronic.
    pub chronic_min:    u32,
    /// Counts strictly above this are Extreme.
    pub extreme_above:  u32,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            persistent_min: 3,
            chronic_min:    10,
            extreme_above:  18,
        }
    }
}

// ── Agent scoring ───────────────────────────────────────────────────

/// Weights of the six composite components. Must sum to 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreWeights {
    pub fcr:        f64,
    pub sla:        f64,
    pub response:   f64,
    pub resolution: f64,
    pub backlog:    f64,
    pub volume:     f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.fcr + self.sla + self.response + self.resolution + self.backlog + self.volume
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            fcr:        0.30,
            sla:        0.25,
            response:   0.15,
            resolution: 0.15,
            backlog:    0.05,
            volume:     0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoreConfig {
    /// FCR rate (percent) that earns a component score of 100.
    pub fcr_target_rate:           f64,
    /// SLA rate (percent) that earns a component score of 100.
    pub sla_target_rate:           f64,
    /// Mean first-response minutes that earns 100; faster earns more.
    pub response_target_minutes:   f64,
    /// Mean resolution minutes that earns 100; faster earns more.
    pub resolution_target_minutes: f64,
    /// Upper clamp applied to every component before weighting.
    pub component_cap:             f64,
    /// Points lost per open backlog ticket.
    pub backlog_penalty_per_ticket: f64,
    /// Backlog above this scores 0 outright.
    pub backlog_cutoff:            u32,
    pub weights:                   ScoreWeights,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            fcr_target_rate:            75.0,
            sla_target_rate:            85.0,
            response_target_minutes:    60.0,
            resolution_target_minutes:  1440.0,
            component_cap:              120.0,
            backlog_penalty_per_ticket: 5.0,
            backlog_cutoff:             10,
            weights:                    ScoreWeights::default(),
        }
    }
}

/// Lower bounds of the composite grade bands; below `silver` is Bronze.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GradeBands {
    pub platinum: f64,
    pub gold:     f64,
    pub silver:   f64,
}

impl Default for GradeBands {
    fn default() -> Self {
        Self {
            platinum: 85.0,
            gold:     70.0,
            silver:   50.0,
        }
    }
}

// ── Top level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub risk_thresholds:       RiskThresholds,
    pub score:                 ScoreConfig,
    /// A ticket is SLA-compliant when resolved within this many minutes.
    pub sla_threshold_minutes: f64,
    /// Trend moves smaller than this are flat.
    pub trend_epsilon:         f64,
    pub grade_bands:           GradeBands,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            risk_thresholds:       RiskThresholds::default(),
            score:                 ScoreConfig::default(),
            sla_threshold_minutes: 1440.0,
            trend_epsilon:         0.01,
            grade_bands:           GradeBands::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load from a JSON file. Absent fields keep their defaults.
    pub fn load(path: &str) -> AnalyticsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyticsError::Config {
            path:   path.to_string(),
            reason: format!("cannot read: {e}"),
        })?;
        let config: AnalyticsConfig =
            serde_json::from_str(&content).map_err(|e| AnalyticsError::Config {
                path:   path.to_string(),
                reason: e.to_string(),
            })?;
        config.validate().map_err(|reason| AnalyticsError::Config {
            path: path.to_string(),
            reason,
        })?;
        log::debug!("Loaded analytics config from {path}");
        Ok(config)
    }

    /// Check internal consistency. Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        let total = self.score.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(format!("score weights sum to {total}, expected 1.0"));
        }
        let t = &self.risk_thresholds;
        if !(t.persistent_min <= t.chronic_min && t.chronic_min <= t.extreme_above) {
            return Err(format!(
                "risk thresholds out of order: persistent {} / chronic {} / extreme above {}",
                t.persistent_min, t.chronic_min, t.extreme_above
            ));
        }
        let b = &self.grade_bands;
        if !(b.silver <= b.gold && b.gold <= b.platinum) {
            return Err("grade bands out of order".into());
        }
        if self.score.component_cap <= 0.0 {
            return Err("component_cap must be positive".into());
        }
        Ok(())
    }
}
