use helpdesk_core::trend::{
    insight_for, trend_of, trend_of_with_epsilon, MetricKind, TrendDirection, TrendInsight,
};

#[test]
fn fewer_than_two_points_is_flat() {
    for series in [&[][..], &[50.0][..]] {
        let t = trend_of(series);
        assert_eq!(t.direction, TrendDirection::Flat, "{series:?}");
        assert_eq!(t.delta, 0.0);
    }
}

#[test]
fn moves_below_epsilon_are_flat() {
    assert_eq!(trend_of(&[50.0, 50.005]).direction, TrendDirection::Flat);
    assert_eq!(trend_of(&[50.0, 49.995]).direction, TrendDirection::Flat);
}

#[test]
fn up_and_down() {
    let up = trend_of(&[50.0, 52.0]);
    assert_eq!(up.direction, TrendDirection::Up);
    assert_eq!(up.delta, 2.0);
    assert!((up.pct_change - 4.0).abs() < 1e-9);

    let down = trend_of(&[52.0, 50.0]);
    assert_eq!(down.direction, TrendDirection::Down);
    assert_eq!(down.delta, -2.0);
}

/// Only the last two points matter.
#[test]
fn only_latest_move_counts() {
    assert_eq!(trend_of(&[10.0, 90.0, 40.0, 41.0]).direction, TrendDirection::Up);
    assert_eq!(trend_of(&[90.0, 10.0, 41.0, 40.0]).direction, TrendDirection::Down);
}

#[test]
fn pct_change_from_zero_is_zero() {
    let t = trend_of(&[0.0, 5.0]);
    assert_eq!(t.direction, TrendDirection::Up);
    assert_eq!(t.pct_change, 0.0);
}

#[test]
fn non_finite_points_are_flat() {
    for series in [
        [1.0, f64::NAN],
        [f64::NAN, 1.0],
        [0.0, f64::INFINITY],
        [f64::NEG_INFINITY, 3.0],
        [f64::INFINITY, f64::INFINITY],
    ] {
        let t = trend_of(&series);
        assert_eq!(t.direction, TrendDirection::Flat, "{series:?}");
        assert_eq!(t.delta, 0.0, "{series:?}");
        assert_eq!(t.pct_change, 0.0, "{series:?}");
    }
    // A bad point earlier in the series does not matter.
    assert_eq!(trend_of(&[f64::NAN, 50.0, 52.0]).direction, TrendDirection::Up);
}

#[test]
fn custom_epsilon() {
    assert_eq!(trend_of_with_epsilon(&[50.0, 52.0], 5.0).direction, TrendDirection::Flat);
}

#[test]
fn every_metric_has_three_insights() {
    for kind in MetricKind::ALL {
        let texts = [
            insight_for(kind, TrendDirection::Up),
            insight_for(kind, TrendDirection::Down),
            insight_for(kind, TrendDirection::Flat),
        ];
        for text in texts {
            assert!(!text.is_empty(), "{kind:?} missing copy");
        }
        assert_ne!(texts[0], texts[1], "{kind:?} up/down copy identical");
    }
}

#[test]
fn insight_pairs_trend_and_copy() {
    let insight = TrendInsight::of(MetricKind::Backlog, &[3.0, 7.0], 0.01);
    assert_eq!(insight.trend.direction, TrendDirection::Up);
    assert_eq!(insight.text, insight_for(MetricKind::Backlog, TrendDirection::Up));
}
