// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::summary;
use crate::utils::{http_client, month_key, today};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

const MODEL: &str = "gemini-2.0-flash";

#[derive(Serialize)]
struct GenRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

/// Send a compact digest of recent spending to the generative endpoint
/// and print its advice. Disabled gracefully when no key is configured.
pub fn handle(conn: &Connection) -> Result<()> {
    let Ok(key) = std::env::var("GEMINI_API_KEY") else {
        println!("GEMINI_API_KEY is not set; insights are disabled.");
        return Ok(());
    };

    let digest = spending_digest(conn)?;
    if digest["recent"].as_array().map(|a| a.is_empty()).unwrap_or(true) {
        println!("Not enough data yet. Record a few transactions first.");
        return Ok(());
    }

    let prompt = format!(
        "You are a professional financial advisor. Based on the spending data \
         below, give the user one short, friendly, actionable piece of advice \
         (two sentences maximum). Data: {}",
        digest
    );
    let body = GenRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
    };

    let url = format!(
        "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
        MODEL, key
    );
    let client = http_client()?;
    let resp: GenResponse = client
        .post(url)
        .json(&body)
        .send()
        .context("Call insights endpoint")?
        .error_for_status()
        .context("Insights endpoint returned an error")?
        .json()
        .context("Parse insights response")?;

    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text);
    match text {
        Some(t) => println!("{}", t.trim()),
        None => println!("No insight available right now; try again later."),
    }
    Ok(())
}

fn spending_digest(conn: &Connection) -> Result<serde_json::Value> {
    let month = month_key(today());
    let totals = summary::compute(conn, &month)?;

    let mut stmt = conn.prepare(
        "SELECT t.description, t.amount, c.name, t.type
         FROM transactions t LEFT JOIN categories c ON t.category_id=c.id
         ORDER BY t.date DESC, t.id DESC LIMIT 10",
    )?;
    let mut rows = stmt.query([])?;
    let mut recent = Vec::new();
    while let Some(r) = rows.next()? {
        let desc: Option<String> = r.get(0)?;
        let cat: Option<String> = r.get(2)?;
        recent.push(json!({
            "desc": desc.unwrap_or_default(),
            "amt": r.get::<_, String>(1)?,
            "cat": cat.unwrap_or_default(),
            "type": r.get::<_, String>(3)?,
        }));
    }

    Ok(json!({
        "summary": {
            "month": totals.month,
            "income": totals.total_income.to_string(),
            "expense": totals.total_expense.to_string(),
        },
        "recent": recent,
    }))
}
