use helpdesk_core::{config::AnalyticsConfig, error::AnalyticsError};
use std::path::PathBuf;

fn write_config(name: &str, body: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("helpdesk-config-{name}-{}.json", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn defaults_are_valid() {
    let config = AnalyticsConfig::default();
    assert!(config.validate().is_ok());
    assert!((config.score.weights.total() - 1.0).abs() < 1e-9);
    assert_eq!(config.risk_thresholds.extreme_above, 18);
    assert_eq!(config.sla_threshold_minutes, 1440.0);
    assert_eq!(config.trend_epsilon, 0.01);
}

#[test]
fn partial_file_keeps_defaults() {
    let path = write_config("partial", r#"{ "risk_thresholds": { "persistent_min": 4 }, "trend_epsilon": 0.5 }"#);
    let config = AnalyticsConfig::load(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.risk_thresholds.persistent_min, 4);
    assert_eq!(config.risk_thresholds.chronic_min, 10);
    assert_eq!(config.trend_epsilon, 0.5);
    assert_eq!(config.score, AnalyticsConfig::default().score);
}

#[test]
fn unbalanced_weights_are_rejected() {
    let path = write_config("weights", r#"{ "score": { "weights": { "fcr": 0.9 } } }"#);
    let result = AnalyticsConfig::load(path.to_str().unwrap());
    std::fs::remove_file(&path).ok();

    match result {
        Err(AnalyticsError::Config { reason, .. }) => {
            assert!(reason.contains("weights"), "unexpected reason: {reason}")
        }
        other => panic!("expected a config error, got {other:?}"),
    }
}

#[test]
fn malformed_json_is_a_config_error() {
    let path = write_config("malformed", "{ not json");
    let result = AnalyticsConfig::load(path.to_str().unwrap());
    std::fs::remove_file(&path).ok();
    assert!(matches!(result, Err(AnalyticsError::Config { .. })));
}

#[test]
fn missing_file_is_a_config_error() {
    let result = AnalyticsConfig::load("/no/such/helpdesk-config.json");
    assert!(matches!(result, Err(AnalyticsError::Config { .. })));
}

#[test]
fn out_of_order_thresholds_fail_validation() {
    let mut config = AnalyticsConfig::default();
    config.risk_thresholds.chronic_min = 2;
    assert!(config.validate().is_err());
}
