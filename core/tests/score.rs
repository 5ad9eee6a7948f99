use helpdesk_core::{
    bucketer::{agent_monthly_series, AgentMonthlyBucket, MonthlyMetrics},
    config::{AnalyticsConfig, GradeBands, ScoreConfig},
    score::{
        monthly_scores, rank_agents, score_agent, score_metrics, score_window, window_metrics,
        AgentScore, AgentSummary, ScoreComponents, ScoreGrade,
    },
    ticket::{HandlingStage, Ticket},
    types::MonthKey,
    window::{filter_tickets, FilterWindow},
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn strong_month() -> MonthlyMetrics {
    MonthlyMetrics {
        volume:                      10,
        backlog:                     0,
        mean_first_response_minutes: 30.0,
        mean_resolution_minutes:     600.0,
        fcr_rate:                    100.0,
        sla_rate:                    100.0,
    }
}

/// Opened 09:00, first touch 09:30, closed 19:00 on `day` of January 2024.
fn quick_ticket(agent: &str, day: u32) -> Ticket {
    let at = |hm: &str| Some(format!("2024-01-{day:02} {hm}:00"));
    Ticket {
        ticket_id: format!("{agent}-{day}"),
        customer_id: Some("C1".into()),
        open_by: Some(agent.into()),
        status: "Closed".into(),
        open_time: at("09:00"),
        first_handling_closed_at: at("09:30"),
        close_time: at("19:00"),
        handlings: vec![HandlingStage { note: Some("done".into()), closed_at: at("09:30") }],
        ..Default::default()
    }
}

fn score(agent: &str, composite: i64) -> AgentScore {
    AgentScore {
        agent: agent.into(),
        composite,
        components: ScoreComponents::default(),
    }
}

// ── Components ───────────────────────────────────────────────────────────────

#[test]
fn strong_agent_components_and_composite() {
    let config = ScoreConfig::default();
    let s = score_metrics("ana", &strong_month(), 10, &config);

    assert_eq!(s.components.fcr, 120.0, "133% of target clamps to the cap");
    assert!((s.components.sla - 117.647).abs() < 1e-3, "sla {}", s.components.sla);
    assert_eq!(s.components.response, 120.0);
    assert_eq!(s.components.resolution, 120.0);
    assert_eq!(s.components.backlog, 100.0);
    assert_eq!(s.components.volume, 100.0);
    assert_eq!(s.composite, 116, "composite is not clamped back to 100");
}

#[test]
fn components_never_exceed_cap() {
    let mut m = strong_month();
    m.mean_first_response_minutes = 0.001;
    m.fcr_rate = 1000.0;
    let s = score_metrics("ana", &m, 1, &ScoreConfig::default());
    for (name, value) in [
        ("fcr", s.components.fcr),
        ("sla", s.components.sla),
        ("response", s.components.response),
        ("resolution", s.components.resolution),
        ("backlog", s.components.backlog),
        ("volume", s.components.volume),
    ] {
        assert!((0.0..=120.0).contains(&value), "{name} = {value}");
    }
}

/// No data at all: only backlog (none) and volume (no peers) contribute.
#[test]
fn empty_agent_scores_fifteen() {
    let s = score_metrics("idle", &MonthlyMetrics::default(), 0, &ScoreConfig::default());
    assert_eq!(s.components.response, 0.0);
    assert_eq!(s.components.resolution, 0.0);
    assert_eq!(s.components.volume, 100.0);
    assert_eq!(s.composite, 15);
}

#[test]
fn backlog_penalty_steps() {
    let config = ScoreConfig::default();
    let backlog_score = |backlog| {
        let m = MonthlyMetrics { backlog, ..MonthlyMetrics::default() };
        ScoreComponents::compute(&m, 0, &config).backlog
    };
    assert_eq!(backlog_score(0), 100.0);
    assert_eq!(backlog_score(3), 85.0);
    assert_eq!(backlog_score(10), 50.0);
    assert_eq!(backlog_score(11), 0.0);
}

#[test]
fn volume_is_relative_to_busiest() {
    let mut m = strong_month();
    m.volume = 5;
    let s = score_metrics("ana", &m, 20, &ScoreConfig::default());
    assert_eq!(s.components.volume, 25.0);
}

#[test]
fn score_agent_reads_bucket() {
    let bucket = AgentMonthlyBucket {
        agent:   "ana".into(),
        month:   MonthKey::new(2024, 1).unwrap(),
        metrics: strong_month(),
    };
    let s = score_agent(&bucket, 10);
    assert_eq!(s.agent, "ana");
    assert_eq!(s.composite, 116);
}

// ── Ranking ──────────────────────────────────────────────────────────────────

#[test]
fn ranking_is_descending_and_stable() {
    let ranked = rank_agents(vec![
        score("first-tie", 70),
        score("low", 40),
        score("top", 95),
        score("second-tie", 70),
    ]);
    let order: Vec<&str> = ranked.iter().map(|s| s.agent.as_str()).collect();
    assert_eq!(order, vec!["top", "first-tie", "second-tie", "low"]);
}

// ── End to end ───────────────────────────────────────────────────────────────

#[test]
fn window_scores_from_tickets() {
    let tickets: Vec<Ticket> = (1..=10).map(|d| quick_ticket("ana", d)).collect();
    let window = FilterWindow::months(2024, 1, 1);
    let filtered = filter_tickets(&tickets, &window);

    let per_agent = window_metrics(&filtered, 1440.0);
    assert_eq!(per_agent.len(), 1);
    assert_eq!(per_agent[0].1, strong_month());

    let scores = score_window(&filtered, &AnalyticsConfig::default());
    assert_eq!(scores[0].composite, 116);
}

#[test]
fn monthly_scores_align_with_labels() {
    let mut tickets: Vec<Ticket> = (1..=10).map(|d| quick_ticket("ana", d)).collect();
    tickets.push(quick_ticket("ben", 3));
    let series = agent_monthly_series(&tickets, &FilterWindow::months(2024, 1, 1));
    let monthly = monthly_scores(&series, &ScoreConfig::default());

    assert_eq!(monthly.len(), 2);
    assert_eq!(monthly[0].agent, "ana");
    assert_eq!(monthly[0].scores, vec![116]);
    // Same quality as ana, one tenth of her volume: 116 - 0.10 × 90.
    assert_eq!(monthly[1].scores, vec![107]);
}

#[test]
fn grades_follow_bands() {
    let bands = GradeBands::default();
    assert_eq!(ScoreGrade::from_composite(116, &bands), ScoreGrade::Platinum);
    assert_eq!(ScoreGrade::from_composite(85, &bands), ScoreGrade::Platinum);
    assert_eq!(ScoreGrade::from_composite(70, &bands), ScoreGrade::Gold);
    assert_eq!(ScoreGrade::from_composite(69, &bands), ScoreGrade::Silver);
    assert_eq!(ScoreGrade::from_composite(49, &bands), ScoreGrade::Bronze);
}

#[test]
fn agent_summary_picks_leaders() {
    let mut slow = strong_month();
    slow.mean_resolution_minutes = 900.0;
    let mut busy = strong_month();
    busy.volume = 30;
    let mut unresolved = strong_month();
    unresolved.mean_resolution_minutes = 0.0;

    let per_agent = vec![
        ("slow".to_string(), slow),
        ("busy".to_string(), busy),
        ("unresolved".to_string(), unresolved),
    ];
    let ranked = rank_agents(vec![score("busy", 110), score("slow", 90), score("unresolved", 80)]);
    let summary = AgentSummary::build(&ranked, &per_agent);

    assert_eq!(summary.total_agents, 3);
    assert_eq!(summary.busiest_agent.as_deref(), Some("busy"));
    assert_eq!(summary.top_scorer.as_deref(), Some("busy"));
    assert_eq!(
        summary.fastest_resolver.as_deref(),
        Some("busy"),
        "zero resolution time is ignored; first wins ties"
    );
}
