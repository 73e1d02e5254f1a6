// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{pretty_table, today};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Round-up invariant: 0 <= round_up < 10, and exactly 0 for income.
    let mut stmt = conn.prepare("SELECT id, type, round_up FROM transactions")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let kind: String = r.get(1)?;
        let ru_s: String = r.get(2)?;
        let Ok(ru) = ru_s.parse::<Decimal>() else {
            rows.push(vec!["bad_round_up_value".into(), format!("tx {} '{}'", id, ru_s)]);
            continue;
        };
        if ru < Decimal::ZERO || ru >= Decimal::TEN {
            rows.push(vec!["round_up_out_of_range".into(), format!("tx {} = {}", id, ru)]);
        } else if kind == "income" && ru != Decimal::ZERO {
            rows.push(vec!["income_with_round_up".into(), format!("tx {} = {}", id, ru)]);
        }
    }

    // 2) Duplicate (category, month) budget rows from pre-constraint data.
    let mut stmt2 = conn.prepare(
        "SELECT category_id, month, COUNT(*) FROM budgets GROUP BY category_id, month HAVING COUNT(*) > 1",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let cat: i64 = r.get(0)?;
        let month: String = r.get(1)?;
        let n: i64 = r.get(2)?;
        rows.push(vec![
            "duplicate_budget".into(),
            format!("category {} month {} has {} rows", cat, month, n),
        ]);
    }

    // 3) Subscriptions lagging far behind; the sweep only advances one
    //    period per run, so these take several runs to catch up.
    let cutoff = today() - chrono::Duration::days(90);
    let mut stmt3 = conn.prepare("SELECT id, name, next_date FROM subscriptions WHERE next_date < ?1")?;
    let mut cur3 = stmt3.query([cutoff.to_string()])?;
    while let Some(r) = cur3.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let next: String = r.get(2)?;
        rows.push(vec![
            "subscription_far_behind".into(),
            format!("{} (id {}) due since {}", name, id, next),
        ]);
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
