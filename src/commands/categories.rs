// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, parse_kind, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().trim();
    let kind = parse_kind(sub.get_one::<String>("type").unwrap())?;
    let icon = sub.get_one::<String>("icon").map(|s| s.to_string());
    let color = sub.get_one::<String>("color").map(|s| s.to_string());
    conn.execute(
        "INSERT INTO categories(name, type, icon, color) VALUES (?1, ?2, ?3, ?4)",
        params![name, kind.as_str(), icon, color],
    )?;
    println!("Added {} category '{}'", kind.as_str(), name);
    Ok(())
}

#[derive(Serialize)]
struct CategoryRow {
    id: i64,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    icon: String,
    color: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut stmt =
        conn.prepare("SELECT id, name, type, icon, color FROM categories ORDER BY type, name")?;
    let rows = stmt.query_map([], |r| {
        Ok(CategoryRow {
            id: r.get(0)?,
            name: r.get(1)?,
            kind: r.get(2)?,
            icon: r.get::<_, Option<String>>(3)?.unwrap_or_default(),
            color: r.get::<_, Option<String>>(4)?.unwrap_or_default(),
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let table_rows = data
            .iter()
            .map(|c| {
                vec![
                    c.id.to_string(),
                    c.name.clone(),
                    c.kind.clone(),
                    c.icon.clone(),
                    c.color.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Id", "Name", "Type", "Icon", "Color"], table_rows)
        );
    }
    Ok(())
}
