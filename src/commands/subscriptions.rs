// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rules::{self, ValidationError};
use crate::utils::{
    id_for_category, maybe_print_json, parse_date, parse_decimal, parse_frequency, parse_kind,
    pretty_table, today,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("sweep", _)) => sweep(conn)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount).into());
    }
    let frequency = parse_frequency(sub.get_one::<String>("frequency").unwrap())?;
    let next = parse_date(sub.get_one::<String>("next").unwrap().trim())?;
    let kind = parse_kind(sub.get_one::<String>("type").unwrap())?;
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, c.trim())?),
        None => None,
    };
    conn.execute(
        "INSERT INTO subscriptions(name, amount, category_id, frequency, next_date, type)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            name,
            amount.to_string(),
            category_id,
            frequency.as_str(),
            next.to_string(),
            kind.as_str()
        ],
    )?;
    println!(
        "Subscription '{}' added: {} {}, first due {}",
        name,
        amount,
        frequency.as_str(),
        next
    );
    Ok(())
}

#[derive(Serialize)]
struct SubscriptionRow {
    id: i64,
    name: String,
    amount: String,
    frequency: String,
    next_date: String,
    #[serde(rename = "type")]
    kind: String,
    category: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, s.amount, s.frequency, s.next_date, s.type, c.name
         FROM subscriptions s LEFT JOIN categories c ON s.category_id=c.id
         ORDER BY s.next_date",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok(SubscriptionRow {
            id: r.get(0)?,
            name: r.get(1)?,
            amount: r.get(2)?,
            frequency: r.get(3)?,
            next_date: r.get(4)?,
            kind: r.get(5)?,
            category: r.get::<_, Option<String>>(6)?.unwrap_or_default(),
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let table_rows = data
            .iter()
            .map(|s| {
                vec![
                    s.id.to_string(),
                    s.name.clone(),
                    s.amount.clone(),
                    s.frequency.clone(),
                    s.next_date.clone(),
                    s.kind.clone(),
                    s.category.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Name", "Amount", "Frequency", "Next due", "Type", "Category"],
                table_rows,
            )
        );
    }
    Ok(())
}

fn sweep(conn: &mut Connection) -> Result<()> {
    let outcome = rules::sweep_subscriptions(conn, today())?;
    for (id, err) in &outcome.skipped {
        eprintln!("warning: subscription {} skipped: {}", id, err);
    }
    if outcome.processed == 0 && outcome.skipped.is_empty() {
        println!("No subscriptions due");
    } else {
        println!("Recorded {} due subscription(s)", outcome.processed);
    }
    Ok(())
}
