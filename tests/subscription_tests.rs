// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use kumbara::rules;
use rusqlite::{Connection, params};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    kumbara::db::init_schema(&mut conn).unwrap();
    conn
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn add_sub(conn: &Connection, name: &str, amount: &str, frequency: &str, next: &str) -> i64 {
    conn.execute(
        "INSERT INTO subscriptions(name, amount, frequency, next_date, type)
         VALUES (?1, ?2, ?3, ?4, 'expense')",
        params![name, amount, frequency, next],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn next_date(conn: &Connection, id: i64) -> String {
    conn.query_row(
        "SELECT next_date FROM subscriptions WHERE id=?1",
        params![id],
        |r| r.get(0),
    )
    .unwrap()
}

fn tx_count(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap()
}

#[test]
fn monthly_sweep_clamps_to_february_end() {
    let mut conn = setup();
    let id = add_sub(&conn, "Netflix", "149.99", "monthly", "2024-01-31");

    let outcome = rules::sweep_subscriptions(&mut conn, d("2024-02-01")).unwrap();
    assert_eq!(outcome.processed, 1);
    assert!(outcome.skipped.is_empty());
    assert_eq!(next_date(&conn, id), "2024-02-29");

    // The materialized transaction is dated at sweep time and carries the
    // subscription's amount and name.
    let (amount, desc, date): (String, String, String) = conn
        .query_row(
            "SELECT amount, description, date FROM transactions",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(amount, "149.99");
    assert_eq!(desc, "Netflix");
    assert_eq!(date, "2024-02-01");
}

#[test]
fn weekly_and_yearly_sweeps_advance_one_period() {
    let mut conn = setup();
    let weekly = add_sub(&conn, "Gym", "80", "weekly", "2024-03-04");
    let yearly = add_sub(&conn, "Domain", "300", "yearly", "2024-03-01");

    let outcome = rules::sweep_subscriptions(&mut conn, d("2024-03-04")).unwrap();
    assert_eq!(outcome.processed, 2);
    assert_eq!(next_date(&conn, weekly), "2024-03-11");
    assert_eq!(next_date(&conn, yearly), "2025-03-01");
    assert_eq!(tx_count(&conn), 2);
}

#[test]
fn overdue_subscription_advances_one_step_per_sweep() {
    let mut conn = setup();
    let id = add_sub(&conn, "Spotify", "60", "monthly", "2024-01-01");

    rules::sweep_subscriptions(&mut conn, d("2024-06-15")).unwrap();
    assert_eq!(next_date(&conn, id), "2024-02-01");
    assert_eq!(tx_count(&conn), 1);

    // Still due; the next sweep takes the next step.
    rules::sweep_subscriptions(&mut conn, d("2024-06-15")).unwrap();
    assert_eq!(next_date(&conn, id), "2024-03-01");
    assert_eq!(tx_count(&conn), 2);
}

#[test]
fn future_subscriptions_are_untouched() {
    let mut conn = setup();
    let id = add_sub(&conn, "Insurance", "500", "monthly", "2024-07-01");

    let outcome = rules::sweep_subscriptions(&mut conn, d("2024-06-15")).unwrap();
    assert_eq!(outcome.processed, 0);
    assert_eq!(next_date(&conn, id), "2024-07-01");
    assert_eq!(tx_count(&conn), 0);
}

#[test]
fn due_on_today_is_inclusive() {
    let mut conn = setup();
    add_sub(&conn, "Rent", "12000", "monthly", "2024-06-15");
    let outcome = rules::sweep_subscriptions(&mut conn, d("2024-06-15")).unwrap();
    assert_eq!(outcome.processed, 1);
}

#[test]
fn materialized_payments_bypass_the_round_up_engine() {
    let mut conn = setup();
    conn.execute("INSERT INTO goals(name, target_amount) VALUES ('G', '100')", [])
        .unwrap();
    // 47 would divert 3 on the single-create path.
    add_sub(&conn, "Box sub", "47", "monthly", "2024-06-01");

    rules::sweep_subscriptions(&mut conn, d("2024-06-01")).unwrap();

    let round_up: String = conn
        .query_row("SELECT round_up FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(round_up, "0");
    let goal: String = conn
        .query_row("SELECT current_amount FROM goals", [], |r| r.get(0))
        .unwrap();
    assert_eq!(goal, "0");
}

#[test]
fn bad_row_is_skipped_and_reported_without_aborting() {
    let mut conn = setup();
    // Corrupt amount sneaks past the CHECK constraints.
    add_sub(&conn, "Broken", "not-a-number", "monthly", "2024-06-01");
    let ok = add_sub(&conn, "Fine", "10", "monthly", "2024-06-01");

    let outcome = rules::sweep_subscriptions(&mut conn, d("2024-06-15")).unwrap();
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(next_date(&conn, ok), "2024-07-01");
}
