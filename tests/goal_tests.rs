// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use kumbara::rules;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

fn setup_with_goal(target: &str) -> (Connection, i64) {
    let mut conn = Connection::open_in_memory().unwrap();
    kumbara::db::init_schema(&mut conn).unwrap();
    conn.execute(
        "INSERT INTO goals(name, target_amount) VALUES ('Araba', ?1)",
        params![target],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    (conn, id)
}

fn balance(conn: &Connection, id: i64) -> Decimal {
    let s: String = conn
        .query_row(
            "SELECT current_amount FROM goals WHERE id=?1",
            params![id],
            |r| r.get(0),
        )
        .unwrap();
    s.parse().unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

#[test]
fn contributions_accumulate() {
    let (mut conn, goal) = setup_with_goal("1000");
    assert_eq!(rules::contribute_to_goal(&mut conn, goal, dec("40")).unwrap(), 1);
    assert_eq!(rules::contribute_to_goal(&mut conn, goal, dec("2.50")).unwrap(), 1);
    assert_eq!(balance(&conn, goal), dec("42.50"));
}

#[test]
fn balance_may_exceed_target() {
    let (mut conn, goal) = setup_with_goal("100");
    rules::contribute_to_goal(&mut conn, goal, dec("80")).unwrap();
    rules::contribute_to_goal(&mut conn, goal, dec("50")).unwrap();
    // No clamp at the target; over-saving is allowed.
    assert_eq!(balance(&conn, goal), dec("130"));
}

#[test]
fn negative_contribution_withdraws() {
    let (mut conn, goal) = setup_with_goal("100");
    rules::contribute_to_goal(&mut conn, goal, dec("60")).unwrap();
    rules::contribute_to_goal(&mut conn, goal, dec("-25")).unwrap();
    assert_eq!(balance(&conn, goal), dec("35"));
}

#[test]
fn unknown_goal_is_a_no_op() {
    let (mut conn, goal) = setup_with_goal("100");
    let n = rules::contribute_to_goal(&mut conn, 9999, dec("10")).unwrap();
    assert_eq!(n, 0);
    assert_eq!(balance(&conn, goal), Decimal::ZERO);
}
