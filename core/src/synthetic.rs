//! Seeded synthetic ticket batches for demos and determinism checks.
//!
//! Same (seed, count, start month) → byte-identical batch. Ticket ids are
//! UUID-shaped but come from the RNG, never from the platform.

use crate::{
    rng::{BatchRng, BatchStream},
    ticket::{HandlingStage, Ticket, MAX_HANDLING_STAGES},
    types::MonthKey,
};
use chrono::{Duration, NaiveDateTime};

/// Months a generated batch spreads over, starting at `start_month`.
pub const SPAN_MONTHS: u32 = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const AGENTS: &[&str] = &[
    "amira.haddad", "ben.okafor", "chloe.martin", "dev.patel", "elena.rossi", "farid.nasser",
];

const FIRST_NAMES: &[&str] = &[
    "Ava", "Omar", "Lina", "Noah", "Sara", "Youssef", "Mia", "Karim", "Leah", "Tariq",
];

const LAST_NAMES: &[&str] = &[
    "Benali", "Carter", "Dubois", "Hassan", "Ivanova", "Khan", "Lopez", "Moreau", "Nguyen", "Silva",
];

const NO_SUBCLASSES: &[&str] = &[];

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Billing",   &["Invoice dispute", "Refund request", "Double charge"]),
    ("Technical", &["Outage", "Slow connection", "Device setup"]),
    ("Account",   &["Password reset", "Profile update", "Closure request"]),
];

/// Generate `count` tickets opened from `start_month` onwards.
pub fn generate(seed: u64, count: usize, start_month: MonthKey) -> Vec<Ticket> {
    let mut identity = BatchRng::new(seed, BatchStream::Identity);
    let mut customer_rng = BatchRng::new(seed, BatchStream::Customer);
    let mut agent_rng = BatchRng::new(seed, BatchStream::Agent);
    let mut timing = BatchRng::new(seed, BatchStream::Timing);
    let mut handling_rng = BatchRng::new(seed, BatchStream::Handling);

    let customers = customer_pool(&mut customer_rng, (count / 4).max(1));

    let tickets: Vec<Ticket> = (0..count)
        .map(|_| {
            let ticket_id = next_uuid(&mut identity);

            // Pareto rank: a handful of customers file most of the tickets.
            let rank = customer_rng.pareto(1.0, 1.1) as usize - 1;
            let (customer_id, customer_name) = &customers[rank.min(customers.len() - 1)];
            let open_by = agent_rng.pick(AGENTS).map(|a| a.to_string());
            let (category, subs) = customer_rng.pick(CATEGORIES).copied().unwrap_or(("General", NO_SUBCLASSES));
            let sub_classification = customer_rng.pick(subs).map(|s| s.to_string());

            let opened = open_instant(&mut timing, start_month);
            let (status, close_time, first_handling_closed_at, handlings) = match opened {
                Some(opened) => lifecycle(&mut timing, &mut handling_rng, opened),
                None => ("Open".to_string(), None, None, Vec::new()),
            };

            // Roughly one ticket in a hundred carries a broken open time.
            let open_time = if timing.chance(0.01) {
                Some("n/a".to_string())
            } else {
                opened.map(format_ts)
            };

            Ticket {
                ticket_id,
                customer_id: Some(customer_id.clone()),
                customer_name: Some(customer_name.clone()),
                open_by,
                category: Some(category.to_string()),
                classification: Some(format!("{category} request")),
                sub_classification,
                status,
                open_time,
                close_time,
                first_handling_closed_at,
                handlings,
                repeat_class: None,
            }
        })
        .collect();

    log::debug!(
        "generated {} synthetic ticket(s) for {} customer(s) from {start_month}, seed {seed}",
        tickets.len(),
        customers.len()
    );
    tickets
}

fn next_uuid(rng: &mut BatchRng) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    uuid::Builder::from_random_bytes(bytes).into_uuid().to_string()
}

fn customer_pool(rng: &mut BatchRng, size: usize) -> Vec<(String, String)> {
    (0..size)
        .map(|i| {
            let first = rng.pick(FIRST_NAMES).copied().unwrap_or("Alex");
            let last = rng.pick(LAST_NAMES).copied().unwrap_or("Doe");
            (format!("CUST-{:05}", i + 1), format!("{first} {last}"))
        })
        .collect()
}

fn format_ts(instant: NaiveDateTime) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

fn open_instant(rng: &mut BatchRng, start_month: MonthKey) -> Option<NaiveDateTime> {
    let mut month = start_month;
    for _ in 0..rng.below(u64::from(SPAN_MONTHS)) {
        month = month.succ();
    }
    let offset = Duration::days(rng.below(28) as i64)
        + Duration::hours(8 + rng.below(10) as i64)
        + Duration::minutes(rng.below(60) as i64);
    month.first_instant()?.checked_add_signed(offset)
}

type Lifecycle = (String, Option<String>, Option<String>, Vec<HandlingStage>);

/// Status, close time, first-stage close time and handling stages of one ticket.
fn lifecycle(timing: &mut BatchRng, handling_rng: &mut BatchRng, opened: NaiveDateTime) -> Lifecycle {
    let first_touch = opened + Duration::minutes(5 + timing.below(240) as i64);

    // 1 stage most of the time, deeper escalations increasingly rare.
    let mut depth = 1;
    while depth < MAX_HANDLING_STAGES && handling_rng.chance(0.3) {
        depth += 1;
    }

    let mut handlings = Vec::with_capacity(depth);
    let mut cursor = first_touch;
    for stage in 0..depth {
        if stage > 0 {
            cursor += Duration::minutes(30 + handling_rng.below(600) as i64);
        }
        handlings.push(HandlingStage {
            note:      Some(format!("Stage {} handled", stage + 1)),
            closed_at: Some(format_ts(cursor)),
        });
    }

    if timing.chance(0.12) {
        return ("Open".to_string(), None, Some(format_ts(first_touch)), handlings);
    }

    let resolution_minutes = timing.pareto(90.0, 1.3).min(14.0 * 24.0 * 60.0) as i64;
    let closed = (opened + Duration::minutes(resolution_minutes)).max(cursor);
    let status = if depth > 2 && timing.chance(0.2) { "Escalated" } else { "Closed" };

    (
        status.to_string(),
        Some(format_ts(closed)),
        Some(format_ts(first_touch)),
        handlings,
    )
}
