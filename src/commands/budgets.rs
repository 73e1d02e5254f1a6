// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rules;
use crate::utils::{
    id_for_category, maybe_print_json, month_key, parse_decimal, parse_month, pretty_table, today,
};
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn set(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let cat = sub.get_one::<String>("category").unwrap().trim();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    // The rule takes the month explicitly; resolve "now" here.
    let month = match sub.get_one::<String>("month") {
        Some(s) => parse_month(s.trim())?,
        None => month_key(today()),
    };
    let cat_id = id_for_category(conn, cat)?;

    let result = rules::upsert_budget(conn, cat_id, amount, &month)?;
    if result.updated {
        println!("Budget for {} / {} updated to {}", month, cat, amount);
    } else {
        println!("Budget for {} / {} set to {}", month, cat, amount);
    }
    Ok(())
}

#[derive(Serialize)]
struct BudgetRow {
    id: i64,
    month: String,
    category: String,
    amount: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut sql = String::from(
        "SELECT b.id, b.month, c.name, b.amount FROM budgets b JOIN categories c ON b.category_id=c.id",
    );
    let month = sub.get_one::<String>("month");
    let mut data = Vec::new();
    if let Some(month) = month {
        sql.push_str(" WHERE b.month=?1 ORDER BY c.name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![month], row_mapper)?;
        for row in rows {
            data.push(row?);
        }
    } else {
        sql.push_str(" ORDER BY b.month DESC, c.name");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_mapper)?;
        for row in rows {
            data.push(row?);
        }
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.month.clone(),
                    b.category.clone(),
                    b.amount.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Month", "Category", "Amount"], rows)
        );
    }
    Ok(())
}

fn row_mapper(r: &rusqlite::Row<'_>) -> rusqlite::Result<BudgetRow> {
    Ok(BudgetRow {
        id: r.get(0)?,
        month: r.get(1)?,
        category: r.get(2)?,
        amount: r.get(3)?,
    })
}
