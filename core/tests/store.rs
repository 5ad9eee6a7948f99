use helpdesk_core::{
    store::{load_tickets_json, TicketSource, TicketStore},
    synthetic,
    ticket::{HandlingStage, Ticket},
    types::MonthKey,
};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_store() -> TicketStore {
    let store = TicketStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn escalated_ticket() -> Ticket {
    Ticket {
        ticket_id: "T-100".into(),
        customer_id: Some("C-9".into()),
        customer_name: Some("Nadia Benali".into()),
        open_by: Some("dev.patel".into()),
        category: Some("Billing".into()),
        classification: Some("Billing request".into()),
        sub_classification: Some("Refund request".into()),
        status: "Escalated".into(),
        open_time: Some("2024-05-02 08:15:00".into()),
        close_time: Some("2024-05-04 17:00:00".into()),
        first_handling_closed_at: Some("2024-05-02 09:00:00".into()),
        handlings: vec![
            HandlingStage { note: Some("triage".into()), closed_at: Some("2024-05-02 09:00:00".into()) },
            HandlingStage::default(),
            HandlingStage { note: Some("finance".into()), closed_at: Some("2024-05-04 16:30:00".into()) },
        ],
        repeat_class: None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn ticket_round_trips_with_handlings() {
    let store = make_store();
    let ticket = escalated_ticket();
    store.insert_ticket(&ticket).unwrap();

    assert_eq!(store.ticket_count().unwrap(), 1);
    let fetched = store.fetch_all().unwrap();
    assert_eq!(fetched, vec![ticket]);
}

#[test]
fn fetch_keeps_insertion_order() {
    let store = make_store();
    let batch = synthetic::generate(11, 40, MonthKey::new(2024, 1).unwrap());
    store.insert_all(&batch).unwrap();

    let fetched = store.fetch_all().unwrap();
    assert_eq!(fetched.len(), batch.len());
    assert_eq!(fetched, batch);
}

#[test]
fn duplicate_ids_are_rejected_atomically() {
    let store = make_store();
    let ticket = escalated_ticket();
    let result = store.insert_all(&[ticket.clone(), ticket]);
    assert!(result.is_err(), "duplicate ticket id must fail");
    assert_eq!(store.ticket_count().unwrap(), 0, "failed batch leaves nothing behind");
}

#[test]
fn store_accepts_batches_after_a_failed_one() {
    let store = make_store();
    let ticket = escalated_ticket();
    assert!(store.insert_all(&[ticket.clone(), ticket.clone()]).is_err());

    // No transaction is left open: the next batch commits normally.
    store.insert_all(&[ticket.clone()]).expect("store usable after rollback");
    let mut second = ticket;
    second.ticket_id = "T-101".into();
    store.insert_all(&[second]).expect("and again");
    assert_eq!(store.ticket_count().unwrap(), 2);
}

#[test]
fn failure_mid_batch_discards_earlier_rows() {
    let store = make_store();
    let batch = synthetic::generate(3, 10, MonthKey::new(2024, 1).unwrap());
    let mut with_dup = batch.clone();
    with_dup.push(batch[4].clone());
    assert!(store.insert_all(&with_dup).is_err());
    assert_eq!(store.ticket_count().unwrap(), 0);
    assert!(store.fetch_all().unwrap().is_empty(), "handling rows rolled back too");
}

#[test]
fn vec_is_a_ticket_source() {
    let tickets = vec![escalated_ticket()];
    assert_eq!(tickets.fetch_all().unwrap(), tickets);
}

#[test]
fn json_tickets_fill_missing_fields() {
    let path = std::env::temp_dir().join(format!("helpdesk-tickets-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"[{"ticket_id":"J-1","status":"Open","open_time":"2024-02-01 10:00"}]"#,
    )
    .unwrap();

    let tickets = load_tickets_json(path.to_str().unwrap()).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].customer_key(), "Unknown");
    assert_eq!(tickets[0].agent_key(), "Unassigned");
    assert!(tickets[0].handlings.is_empty());
    assert!(tickets[0].is_backlog());
}

#[test]
fn missing_json_file_is_an_error() {
    assert!(load_tickets_json("/definitely/not/here.json").is_err());
}
