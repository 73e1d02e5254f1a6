// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::rules;
use crate::utils::{maybe_print_json, parse_date, parse_decimal, pretty_table};
use anyhow::{Context, Result};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("contribute", sub)) => contribute(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let target = parse_decimal(sub.get_one::<String>("target").unwrap().trim())?;
    let deadline = match sub.get_one::<String>("deadline") {
        Some(s) => Some(parse_date(s.trim())?),
        None => None,
    };
    let color = sub.get_one::<String>("color").map(|s| s.to_string());
    let icon = sub.get_one::<String>("icon").map(|s| s.to_string());
    conn.execute(
        "INSERT INTO goals(name, target_amount, deadline, color, icon) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            target.to_string(),
            deadline.map(|d| d.to_string()),
            color,
            icon
        ],
    )?;
    println!("Goal '{}' created with target {}", name, target);
    Ok(())
}

fn contribute(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let n = rules::contribute_to_goal(conn, id, amount)?;
    if n == 0 {
        println!("No goal with id {}; nothing changed", id);
    } else {
        println!("Contributed {} to goal {}", amount, id);
    }
    Ok(())
}

#[derive(Serialize)]
struct GoalRow {
    id: i64,
    name: String,
    target_amount: String,
    current_amount: String,
    deadline: String,
    progress_pct: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt = conn.prepare(
        "SELECT id, name, target_amount, current_amount, deadline FROM goals ORDER BY id",
    )?;
    let mut rows = stmt.query([])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let id: i64 = r.get(0)?;
        let target_s: String = r.get(2)?;
        let current_s: String = r.get(3)?;
        let deadline: Option<String> = r.get(4)?;
        let target = target_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid target '{}' on goal {}", target_s, id))?;
        let current = current_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid balance '{}' on goal {}", current_s, id))?;
        data.push(GoalRow {
            id,
            name: r.get(1)?,
            target_amount: target_s.clone(),
            current_amount: current_s.clone(),
            deadline: deadline.unwrap_or_default(),
            progress_pct: progress_pct(current, target),
        });
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows = data
            .iter()
            .map(|g| {
                vec![
                    g.id.to_string(),
                    g.name.clone(),
                    g.target_amount.clone(),
                    g.current_amount.clone(),
                    g.deadline.clone(),
                    g.progress_pct.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Name", "Target", "Saved", "Deadline", "Progress"],
                rows,
            )
        );
    }
    Ok(())
}

/// Balances are never clamped in the store; the cap to 100% happens here,
/// at render time only.
fn progress_pct(current: Decimal, target: Decimal) -> String {
    if target <= Decimal::ZERO {
        return "-".into();
    }
    let pct = (current * Decimal::ONE_HUNDRED / target).round_dp(1);
    if pct > Decimal::ONE_HUNDRED {
        "100%".into()
    } else {
        format!("{}%", pct)
    }
}
