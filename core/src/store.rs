//! Ticket sources.
//!
//! RULE: Only store.rs talks to the database or the filesystem.
//! The analytics stages take `&[Ticket]` and never know where it came from.

use rusqlite::{params, Connection};
use std::collections::HashMap;
use crate::{
    error::AnalyticsResult,
    ticket::{HandlingStage, Ticket, MAX_HANDLING_STAGES},
};

/// Anything that can hand over a full ticket batch.
pub trait TicketSource {
    fn fetch_all(&self) -> AnalyticsResult<Vec<Ticket>>;
}

impl TicketSource for Vec<Ticket> {
    fn fetch_all(&self) -> AnalyticsResult<Vec<Ticket>> {
        Ok(self.clone())
    }
}

/// Read a JSON array of tickets.
pub fn load_tickets_json(path: &str) -> AnalyticsResult<Vec<Ticket>> {
    let content = std::fs::read_to_string(path)?;
    let tickets: Vec<Ticket> = serde_json::from_str(&content)?;
    log::debug!("Loaded {} ticket(s) from {path}", tickets.len());
    Ok(tickets)
}

pub struct TicketStore {
    conn: Connection,
}

impl TicketStore {
    /// Open (or create) the ticket database at `path`.
    pub fn open(path: &str) -> AnalyticsResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> AnalyticsResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> AnalyticsResult<()> {
        self.conn.execute_batch(include_str!("../../migrations/001_tickets.sql"))?;
        Ok(())
    }

    // ── Writes ─────────────────────────────────────────────────

    /// Insert one ticket with its handling stages. Stages past the fifth are dropped.
    pub fn insert_ticket(&self, ticket: &Ticket) -> AnalyticsResult<()> {
        self.conn.execute(
            "INSERT INTO ticket (ticket_id, customer_id, customer_name, open_by, category,
                                 classification, sub_classification, status, open_time,
                                 close_time, first_handling_closed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                ticket.ticket_id,
                ticket.customer_id,
                ticket.customer_name,
                ticket.open_by,
                ticket.category,
                ticket.classification,
                ticket.sub_classification,
                ticket.status,
                ticket.open_time,
                ticket.close_time,
                ticket.first_handling_closed_at,
            ],
        )?;
        for (stage, handling) in ticket.handlings.iter().take(MAX_HANDLING_STAGES).enumerate() {
            self.conn.execute(
                "INSERT INTO ticket_handling (ticket_id, stage, note, closed_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![ticket.ticket_id, stage as i64, handling.note, handling.closed_at],
            )?;
        }
        Ok(())
    }

    /// Insert a batch atomically. Any failure rolls the whole batch back.
    pub fn insert_all(&self, tickets: &[Ticket]) -> AnalyticsResult<()> {
        // Rolls back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;
        for ticket in tickets {
            self.insert_ticket(ticket)?;
        }
        tx.commit()?;
        log::debug!("Stored {} ticket(s)", tickets.len());
        Ok(())
    }

    // ── Reads ──────────────────────────────────────────────────

    pub fn ticket_count(&self) -> AnalyticsResult<i64> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM ticket", [], |row| row.get(0))?;
        Ok(n)
    }

    fn handlings_by_ticket(&self) -> AnalyticsResult<HashMap<String, Vec<HandlingStage>>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticket_id, stage, note, closed_at
             FROM ticket_handling ORDER BY ticket_id, stage",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)? as usize,
                    HandlingStage {
                        note:      row.get(2)?,
                        closed_at: row.get(3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_ticket: HashMap<String, Vec<HandlingStage>> = HashMap::new();
        for (ticket_id, stage, handling) in rows {
            let stages = by_ticket.entry(ticket_id).or_default();
            if stages.len() <= stage {
                stages.resize_with(stage + 1, HandlingStage::default);
            }
            stages[stage] = handling;
        }
        Ok(by_ticket)
    }
}

impl TicketSource for TicketStore {
    /// Every stored ticket, in insertion order.
    fn fetch_all(&self) -> AnalyticsResult<Vec<Ticket>> {
        let mut handlings = self.handlings_by_ticket()?;
        let mut stmt = self.conn.prepare(
            "SELECT ticket_id, customer_id, customer_name, open_by, category,
                    classification, sub_classification, status, open_time,
                    close_time, first_handling_closed_at
             FROM ticket ORDER BY rowid ASC",
        )?;
        let tickets = stmt
            .query_map([], |row| {
                Ok(Ticket {
                    ticket_id:                row.get(0)?,
                    customer_id:              row.get(1)?,
                    customer_name:            row.get(2)?,
                    open_by:                  row.get(3)?,
                    category:                 row.get(4)?,
                    classification:           row.get(5)?,
                    sub_classification:       row.get(6)?,
                    status:                   row.get(7)?,
                    open_time:                row.get(8)?,
                    close_time:               row.get(9)?,
                    first_handling_closed_at: row.get(10)?,
                    handlings:                Vec::new(),
                    repeat_class:             None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|mut t| {
                t.handlings = handlings.remove(&t.ticket_id).unwrap_or_default();
                t
            })
            .collect();
        Ok(tickets)
    }
}
