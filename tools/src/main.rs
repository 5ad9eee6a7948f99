//! analytics-runner: headless analytics pass over a helpdesk ticket batch.
//!
//! Usage:
//!   analytics-runner --json tickets.json --year 2024 --start 1 --end 3
//!   analytics-runner --db tickets.db --year ALL --report-json
//!   analytics-runner --synthetic 500 --seed 7 --ipc-mode

use anyhow::{bail, Result};
use helpdesk_core::{
    classifier::tag_repeat_class,
    config::AnalyticsConfig,
    engine::{AnalyticsEngine, AnalyticsReport},
    store::{load_tickets_json, TicketSource, TicketStore},
    synthetic,
    ticket::Ticket,
    types::MonthKey,
    window::{FilterWindow, YearSelection},
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetReport,
    SetWindow {
        #[serde(default)]
        start_month: Option<u32>,
        #[serde(default)]
        end_month: Option<u32>,
        /// A year number or `"ALL"`.
        #[serde(default)]
        year: Option<serde_json::Value>,
    },
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let ipc_mode = has_flag(&args, "--ipc-mode");
    let report_json = has_flag(&args, "--report-json");

    let config = match arg_value(&args, "--config") {
        Some(path) => AnalyticsConfig::load(path)?,
        None => AnalyticsConfig::default(),
    };

    let tickets = load_batch(&args, seed)?;
    let mut window = initial_window(&args, &tickets);
    let engine = AnalyticsEngine::new(config);

    if !ipc_mode && !report_json {
        println!("Helpdesk analytics: analytics-runner");
        println!("  tickets:   {}", tickets.len());
        println!("  window:    {}", window.describe());
        println!();
    }

    if ipc_mode {
        return run_ipc_loop(&engine, &tickets, &mut window);
    }

    let report = engine.run(&tickets, &window);

    if let Some(path) = arg_value(&args, "--tagged-json") {
        let mut tagged = tickets.clone();
        tag_repeat_class(&mut tagged, &report.repeat_tiers);
        std::fs::write(path, serde_json::to_string_pretty(&tagged)?)?;
        log::info!("Wrote {} tagged ticket(s) to {path}", tagged.len());
    }

    if report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

/// `--db`, `--json` or `--synthetic N`. Synthetic tickets given alongside
/// `--db` are written into the database first.
fn load_batch(args: &[String], seed: u64) -> Result<Vec<Ticket>> {
    let synthetic_count: Option<usize> = arg_value(args, "--synthetic").and_then(|v| v.parse().ok());
    let synthetic_batch = || synthetic::generate(seed, synthetic_count.unwrap_or(500), demo_start());

    if let Some(db) = arg_value(args, "--db") {
        let store = TicketStore::open(db)?;
        store.migrate()?;
        if synthetic_count.is_some() {
            store.insert_all(&synthetic_batch())?;
        }
        log::info!("Ticket store {db}: {} ticket(s)", store.ticket_count()?);
        return Ok(store.fetch_all()?);
    }
    if let Some(path) = arg_value(args, "--json") {
        return Ok(load_tickets_json(path)?);
    }
    Ok(synthetic_batch().fetch_all()?)
}

fn demo_start() -> MonthKey {
    MonthKey { year: 2024, month: 1 }
}

/// Explicit `--year/--start/--end`, else the latest month in the batch.
fn initial_window(args: &[String], tickets: &[Ticket]) -> FilterWindow {
    let year = arg_value(args, "--year").and_then(parse_year);
    let start_month = arg_value(args, "--start").and_then(|v| v.parse().ok());
    let end_month = arg_value(args, "--end").and_then(|v| v.parse().ok());

    if year.is_some() || start_month.is_some() || end_month.is_some() {
        return FilterWindow { start_month, end_month, year };
    }
    FilterWindow::latest_month_of(tickets).unwrap_or_else(FilterWindow::all_years)
}

fn parse_year(raw: &str) -> Option<YearSelection> {
    if raw.eq_ignore_ascii_case("ALL") {
        Some(YearSelection::All)
    } else {
        raw.parse().ok().map(YearSelection::Year)
    }
}

fn year_from_json(value: &serde_json::Value) -> Result<YearSelection> {
    match value {
        serde_json::Value::String(s) => match parse_year(s) {
            Some(year) => Ok(year),
            None => bail!("invalid year: {s}"),
        },
        serde_json::Value::Number(n) => match n.as_i64().and_then(|y| i32::try_from(y).ok()) {
            Some(y) => Ok(YearSelection::Year(y)),
            None => bail!("invalid year: {n}"),
        },
        other => bail!("invalid year: {other}"),
    }
}

fn run_ipc_loop(engine: &AnalyticsEngine, tickets: &[Ticket], window: &mut FilterWindow) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                write_error(&mut stdout, &e.to_string())?;
                continue;
            }
        };

        match cmd {
            IpcCommand::Quit => break,
            IpcCommand::GetReport => {
                write_report(&mut stdout, &engine.run(tickets, window))?;
            }
            IpcCommand::SetWindow { start_month, end_month, year } => {
                let year = match year.as_ref().map(year_from_json).transpose() {
                    Ok(y) => y,
                    Err(e) => {
                        write_error(&mut stdout, &e.to_string())?;
                        continue;
                    }
                };
                *window = FilterWindow { start_month, end_month, year };
                log::debug!("IPC window set to {}", window.describe());
                write_report(&mut stdout, &engine.run(tickets, window))?;
            }
        }
    }
    Ok(())
}

fn write_report(out: &mut impl Write, report: &AnalyticsReport) -> Result<()> {
    writeln!(out, "{}", serde_json::to_string(report)?)?;
    out.flush()?;
    Ok(())
}

fn write_error(out: &mut impl Write, message: &str) -> Result<()> {
    writeln!(out, "{}", serde_json::json!({ "error": message }))?;
    out.flush()?;
    Ok(())
}

fn print_summary(report: &AnalyticsReport) {
    println!("=== WINDOW ===");
    println!("  window:         {}", report.window.describe());
    println!("  tickets:        {} of {}", report.filtered_count, report.raw_ticket_count);
    println!("  months:         {}", report.month_labels.join(", "));
    if report.is_empty() {
        println!("  (No tickets in window)");
        return;
    }

    let risk = &report.risk_summary;
    println!();
    println!("=== CUSTOMERS ===");
    println!("  customers:      {}", risk.total);
    println!("  normal:         {}", risk.normal);
    println!("  persistent:     {}", risk.persistent);
    println!("  chronic:        {}", risk.chronic);
    println!("  extreme:        {}", risk.extreme);

    println!();
    println!("=== AGENTS ===");
    let summary = &report.agent_summary;
    println!("  agents scored:  {}", summary.total_agents);
    println!("  top scorer:     {}", summary.top_scorer.as_deref().unwrap_or("-"));
    println!("  busiest:        {}", summary.busiest_agent.as_deref().unwrap_or("-"));
    println!("  fastest:        {}", summary.fastest_resolver.as_deref().unwrap_or("-"));
    for (graded, depth) in report.agent_scores.iter().zip(&report.escalation) {
        println!(
            "  {:<20} {:>4} {:?} | escalated: {}",
            graded.score.agent,
            graded.score.composite,
            graded.grade,
            depth.escalated()
        );
    }

    println!();
    println!("=== TRENDS ===");
    for insight in &report.insights {
        println!(
            "  {:?} {:?} ({:+.2}, {:+.1}%): {}",
            insight.metric,
            insight.trend.direction,
            insight.trend.delta,
            insight.trend.pct_change,
            insight.text
        );
    }
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    arg_value(args, flag)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
