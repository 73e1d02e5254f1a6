// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TxKind;
use crate::rules::{self, NewTransaction};
use crate::utils::{
    id_for_category, maybe_print_json, parse_date, parse_decimal, parse_kind, pretty_table, today,
};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, hash_map::Entry};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => remove(conn, sub)?,
        Some(("import", sub)) => import(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap().trim())?;
    let kind = parse_kind(sub.get_one::<String>("type").unwrap())?;
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s.trim())?,
        None => today(),
    };
    let description = sub.get_one::<String>("desc").map(|s| s.to_string());
    let category_id = match sub.get_one::<String>("category") {
        Some(name) => Some(id_for_category(conn, name.trim())?),
        None => None,
    };

    let created = rules::create_transaction(
        conn,
        &NewTransaction {
            amount,
            description,
            date,
            category_id,
            kind,
            is_ai_generated: sub.get_flag("ai"),
        },
    )?;
    println!(
        "Recorded {} {} on {} (tx #{})",
        kind.as_str(),
        amount,
        date,
        created.id
    );
    if created.round_up > Decimal::ZERO {
        println!("Spare change {} set aside for a goal", created.round_up);
    }
    Ok(())
}

fn remove(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let n = conn.execute("DELETE FROM transactions WHERE id=?1", params![id])?;
    if n == 0 {
        println!("No transaction with id {}", id);
    } else {
        println!("Deleted transaction {}", id);
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.description.clone(),
                    r.category.clone(),
                    r.kind.clone(),
                    r.amount.clone(),
                    r.round_up.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Description", "Category", "Type", "Amount", "Round-up"],
                rows,
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub description: String,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub amount: String,
    pub round_up: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut sql = String::from(
        "SELECT t.id, t.date, t.description, c.name, t.type, t.amount, t.round_up FROM transactions t LEFT JOIN categories c ON t.category_id=c.id WHERE 1=1",
    );
    let mut params_vec: Vec<String> = Vec::new();

    if let Some(month) = sub.get_one::<String>("month") {
        sql.push_str(" AND substr(t.date,1,7)=?");
        params_vec.push(month.into());
    }
    sql.push_str(" ORDER BY t.date DESC, t.id DESC");
    if let Some(limit) = sub.get_one::<usize>("limit") {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = if params_vec.is_empty() {
        stmt.query([])?
    } else {
        let params: Vec<&dyn rusqlite::ToSql> = params_vec
            .iter()
            .map(|s| s as &dyn rusqlite::ToSql)
            .collect();
        stmt.query(rusqlite::params_from_iter(params))?
    };

    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        let description: Option<String> = r.get(2)?;
        let category: Option<String> = r.get(3)?;
        data.push(TransactionRow {
            id: r.get(0)?,
            date: r.get(1)?,
            description: description.unwrap_or_default(),
            category: category.unwrap_or_default(),
            kind: r.get(4)?,
            amount: r.get(5)?,
            round_up: r.get(6)?,
        });
    }
    Ok(data)
}

/// One record of a batch file. JSON items mirror the bulk-import payload
/// of the app's API; CSV columns are date,description,amount,category,type.
#[derive(Debug, Deserialize)]
pub struct BatchItem {
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub kind: TxKind,
    #[serde(default)]
    pub is_ai_generated: bool,
}

fn import(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("path").unwrap().trim();
    let items = if path.ends_with(".json") {
        read_json_batch(path)?
    } else if path.ends_with(".csv") {
        read_csv_batch(path)?
    } else {
        return Err(anyhow!("Unknown batch format for '{}' (use .json or .csv)", path));
    };

    let mut category_cache: HashMap<String, i64> = HashMap::new();
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let category_id = match &item.category {
            Some(name) if !name.is_empty() => {
                let id = match category_cache.entry(name.clone()) {
                    Entry::Occupied(entry) => *entry.get(),
                    Entry::Vacant(entry) => {
                        let fetched = id_for_category(conn, name)?;
                        *entry.insert(fetched)
                    }
                };
                Some(id)
            }
            _ => None,
        };
        records.push(NewTransaction {
            amount: item.amount,
            description: item.description,
            date: item.date,
            category_id,
            kind: item.kind,
            is_ai_generated: item.is_ai_generated,
        });
    }

    let n = rules::ingest_batch(conn, &records)?;
    println!("Imported {} transaction(s) from {}", n, path);
    Ok(())
}

fn read_json_batch(path: &str) -> Result<Vec<BatchItem>> {
    let file = std::fs::File::open(path).with_context(|| format!("Open batch file {}", path))?;
    let items: Vec<BatchItem> =
        serde_json::from_reader(file).with_context(|| format!("Parse JSON batch {}", path))?;
    Ok(items)
}

fn read_csv_batch(path: &str) -> Result<Vec<BatchItem>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;
    let mut items = Vec::new();
    for result in rdr.records() {
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?.trim();
        let description = rec
            .get(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let amount_raw = rec.get(2).context("amount missing")?.trim();
        let category = rec
            .get(3)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let kind_raw = rec.get(4).unwrap_or("expense").trim();

        items.push(BatchItem {
            amount: parse_decimal(amount_raw)
                .with_context(|| format!("Invalid amount '{}' in {}", amount_raw, path))?,
            description,
            date: parse_date(date_raw)?,
            category,
            kind: parse_kind(kind_raw)?,
            is_ai_generated: false,
        });
    }
    Ok(items)
}
