// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use kumbara::rules;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup() -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    kumbara::db::init_schema(&mut conn).unwrap();
    let cat_id: i64 = conn
        .query_row("SELECT id FROM categories WHERE name='Gıda'", [], |r| r.get(0))
        .unwrap();
    (conn, cat_id)
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn upsert_twice_leaves_one_row_with_latest_amount() {
    let (mut conn, cat) = setup();

    let first = rules::upsert_budget(&mut conn, cat, dec("1500"), "2024-03").unwrap();
    assert!(!first.updated);

    let second = rules::upsert_budget(&mut conn, cat, dec("1800"), "2024-03").unwrap();
    assert!(second.updated);
    assert_eq!(second.id, first.id);

    let (count, amount): (i64, String) = conn
        .query_row(
            "SELECT COUNT(*), MAX(amount) FROM budgets WHERE category_id=?1 AND month='2024-03'",
            params![cat],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(amount.parse::<Decimal>().unwrap(), dec("1800"));
}

#[test]
fn different_months_get_separate_rows() {
    let (mut conn, cat) = setup();
    rules::upsert_budget(&mut conn, cat, dec("1500"), "2024-03").unwrap();
    rules::upsert_budget(&mut conn, cat, dec("1600"), "2024-04").unwrap();

    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM budgets WHERE category_id=?1",
            params![cat],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 2);
}

#[test]
fn different_categories_do_not_collide() {
    let (mut conn, cat) = setup();
    let other: i64 = conn
        .query_row("SELECT id FROM categories WHERE name='Kira'", [], |r| r.get(0))
        .unwrap();
    rules::upsert_budget(&mut conn, cat, dec("1500"), "2024-03").unwrap();
    let res = rules::upsert_budget(&mut conn, other, dec("9000"), "2024-03").unwrap();
    assert!(!res.updated);
}

#[test]
fn non_positive_budget_rejected() {
    let (mut conn, cat) = setup();
    assert!(rules::upsert_budget(&mut conn, cat, dec("0"), "2024-03").is_err());
    assert!(rules::upsert_budget(&mut conn, cat, dec("-10"), "2024-03").is_err());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}
