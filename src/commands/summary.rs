// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, month_key, parse_month, pretty_table, today};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Serialize)]
pub struct MonthSummary {
    pub month: String,
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let month = match m.get_one::<String>("month") {
        Some(s) => parse_month(s.trim())?,
        None => month_key(today()),
    };
    let summary = compute(conn, &month)?;
    if !maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &summary)? {
        println!(
            "{}",
            pretty_table(
                &["Month", "Income", "Expense", "Net"],
                vec![vec![
                    summary.month.clone(),
                    summary.total_income.to_string(),
                    summary.total_expense.to_string(),
                    summary.net.to_string(),
                ]],
            )
        );
    }
    Ok(())
}

/// Amounts are decimal text, so totals are summed in Rust rather than
/// with SQL SUM.
pub fn compute(conn: &Connection, month: &str) -> Result<MonthSummary> {
    let mut stmt =
        conn.prepare("SELECT amount, type FROM transactions WHERE substr(date,1,7)=?1")?;
    let mut rows = stmt.query(params![month])?;
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let amount_s: String = r.get(0)?;
        let kind: String = r.get(1)?;
        let amount = amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transactions", amount_s))?;
        if kind == "income" {
            total_income += amount;
        } else {
            total_expense += amount;
        }
    }
    Ok(MonthSummary {
        month: month.to_string(),
        total_income,
        total_expense,
        net: total_income - total_expense,
    })
}
