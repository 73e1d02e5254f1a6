// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use kumbara::models::TxKind;
use kumbara::rules::{self, NewTransaction};
use kumbara::{cli, commands::transactions};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::Builder;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    kumbara::db::init_schema(&mut conn).unwrap();
    conn
}

fn item(amount: &str, day: u32) -> NewTransaction {
    NewTransaction {
        amount: amount.parse().unwrap(),
        description: Some("imported".into()),
        date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        category_id: None,
        kind: TxKind::Expense,
        is_ai_generated: true,
    }
}

#[test]
fn batch_inserts_all_rows_with_zero_round_up() {
    let mut conn = setup();
    conn.execute("INSERT INTO goals(name, target_amount) VALUES ('G', '100')", [])
        .unwrap();

    // Amounts that would all round up on the single-create path.
    let n = rules::ingest_batch(&mut conn, &[item("47", 1), item("33.30", 2), item("8", 3)])
        .unwrap();
    assert_eq!(n, 3);

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 3);

    let nonzero: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE round_up != '0'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(nonzero, 0);

    let goal: String = conn
        .query_row("SELECT current_amount FROM goals", [], |r| r.get(0))
        .unwrap();
    assert_eq!(goal.parse::<Decimal>().unwrap(), Decimal::ZERO);
}

#[test]
fn batch_with_invalid_amount_inserts_nothing() {
    let mut conn = setup();
    let res = rules::ingest_batch(&mut conn, &[item("47", 1), item("-2", 2)]);
    assert!(res.is_err());
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn json_import_resolves_categories_and_skips_round_up() {
    let mut conn = setup();
    conn.execute("INSERT INTO goals(name, target_amount) VALUES ('G', '100')", [])
        .unwrap();

    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"[
            {{"amount": 47, "description": "market", "date": "2024-05-01", "category": "Gıda", "type": "expense", "is_ai_generated": true}},
            {{"amount": "12.40", "date": "2024-05-02", "type": "expense"}},
            {{"amount": 5000, "description": "salary", "date": "2024-05-03", "category": "Maaş", "type": "income"}}
        ]"#
    )
    .unwrap();
    file.flush().unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let matches = cli::build_cli().get_matches_from(["kumbara", "tx", "import", "--path", &path]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    transactions::handle(&mut conn, tx_m).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 3);

    let cat: Option<i64> = conn
        .query_row(
            "SELECT category_id FROM transactions WHERE description='market'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    let gida: i64 = conn
        .query_row("SELECT id FROM categories WHERE name='Gıda'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(cat, Some(gida));

    let ai: i64 = conn
        .query_row(
            "SELECT is_ai_generated FROM transactions WHERE description='market'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(ai, 1);

    let goal: String = conn
        .query_row("SELECT current_amount FROM goals", [], |r| r.get(0))
        .unwrap();
    assert_eq!(goal, "0");
}

#[test]
fn csv_import_inserts_rows() {
    let mut conn = setup();
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "date,description,amount,category,type").unwrap();
    writeln!(file, "2024-05-01,market,47.00,Gıda,expense").unwrap();
    writeln!(file, "2024-05-02,bus card,12.40,,expense").unwrap();
    file.flush().unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let matches = cli::build_cli().get_matches_from(["kumbara", "tx", "import", "--path", &path]);
    let Some(("tx", tx_m)) = matches.subcommand() else {
        panic!("no tx subcommand");
    };
    transactions::handle(&mut conn, tx_m).unwrap();

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 2);
}
