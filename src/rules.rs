// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Monetary-state rules: round-up diversion, batch ingestion, budget
//! upsert, goal contribution, and the subscription due sweep. Everything
//! here works on a plain rusqlite connection so the rules stay testable
//! without the CLI layer.

use anyhow::{Context, Result};
use chrono::{Duration, Months, NaiveDate};
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::models::{Frequency, Subscription, TxKind};

/// Input errors rejected before any write reaches the store. Kept as a
/// separate type so callers can tell a bad request from a store failure.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("amount must be positive (got {0})")]
    NonPositiveAmount(Decimal),
    #[error("unknown transaction type '{0}' (use income|expense)")]
    UnknownKind(String),
    #[error("unknown frequency '{0}' (use weekly|monthly|yearly)")]
    UnknownFrequency(String),
    #[error("cannot advance schedule past {0}")]
    DateOverflow(NaiveDate),
    #[error("amount {0} is out of range")]
    AmountOutOfRange(Decimal),
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub amount: Decimal,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub category_id: Option<i64>,
    pub kind: TxKind,
    pub is_ai_generated: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CreatedTransaction {
    pub id: i64,
    pub round_up: Decimal,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct BudgetUpsert {
    pub id: i64,
    pub updated: bool,
}

/// Result of one due sweep. `skipped` carries (subscription id, error)
/// pairs for rows that failed; the sweep never aborts on them.
#[derive(Debug, Default)]
pub struct SweepOutcome {
    pub processed: usize,
    pub skipped: Vec<(i64, String)>,
}

/// Rounding unit for the spare-change diversion: 10 currency units.
const ROUND_UNIT: Decimal = Decimal::TEN;

/// Spare change between `amount` and the next multiple of the rounding
/// unit. Income never rounds; an exact multiple yields zero. The result
/// always sits in `[0, 10)`. Amounts too large to round to the next
/// multiple are rejected.
pub fn round_up_for(kind: TxKind, amount: Decimal) -> Result<Decimal, ValidationError> {
    match kind {
        TxKind::Income => Ok(Decimal::ZERO),
        TxKind::Expense => {
            let rounded = (amount / ROUND_UNIT)
                .ceil()
                .checked_mul(ROUND_UNIT)
                .ok_or(ValidationError::AmountOutOfRange(amount))?;
            rounded
                .checked_sub(amount)
                .ok_or(ValidationError::AmountOutOfRange(amount))
        }
    }
}

/// Insert a transaction and, for an expense with spare change, divert the
/// round-up into one goal picked uniformly at random. Both writes commit
/// or roll back together; the stored `round_up` column keeps the diverted
/// amount auditable either way.
pub fn create_transaction(conn: &mut Connection, new: &NewTransaction) -> Result<CreatedTransaction> {
    if new.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(new.amount).into());
    }
    let round_up = round_up_for(new.kind, new.amount)?;

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO transactions(amount, description, date, category_id, type, is_ai_generated, round_up)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            new.amount.to_string(),
            new.description,
            new.date.to_string(),
            new.category_id,
            new.kind.as_str(),
            new.is_ai_generated as i64,
            round_up.to_string()
        ],
    )
    .context("Insert transaction")?;
    let id = tx.last_insert_rowid();

    if round_up > Decimal::ZERO {
        if let Some(goal_id) = pick_random_goal(&tx)? {
            add_to_goal(&tx, goal_id, round_up)?;
        }
        // No goals at all: nothing to divert into, not an error.
    }

    tx.commit()?;
    Ok(CreatedTransaction { id, round_up })
}

/// Uniform pick over the current goal ids.
fn pick_random_goal(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM goals")?;
    let ids = stmt
        .query_map([], |r| r.get::<_, i64>(0))?
        .collect::<std::result::Result<Vec<i64>, _>>()?;
    if ids.is_empty() {
        return Ok(None);
    }
    let idx = rand::thread_rng().gen_range(0..ids.len());
    Ok(Some(ids[idx]))
}

/// Additive balance update. Amounts are stored as decimal text, so the
/// increment is read-add-write; callers run it inside a transaction.
fn add_to_goal(conn: &Connection, goal_id: i64, delta: Decimal) -> Result<usize> {
    let current: Option<String> = conn
        .query_row(
            "SELECT current_amount FROM goals WHERE id=?1",
            params![goal_id],
            |r| r.get(0),
        )
        .optional()?;
    let Some(s) = current else {
        return Ok(0);
    };
    let cur = s
        .parse::<Decimal>()
        .with_context(|| format!("Invalid goal balance '{}' for goal {}", s, goal_id))?;
    let n = conn.execute(
        "UPDATE goals SET current_amount=?1 WHERE id=?2",
        params![(cur + delta).to_string(), goal_id],
    )?;
    Ok(n)
}

/// Explicit contribution to a specific goal. Unknown ids affect zero rows
/// and are not an error. The amount may carry any sign and the balance is
/// never clamped to the target, so over-saving and withdrawal both work;
/// progress display is expected to clamp at render time.
pub fn contribute_to_goal(conn: &mut Connection, goal_id: i64, amount: Decimal) -> Result<usize> {
    let tx = conn.transaction()?;
    let n = add_to_goal(&tx, goal_id, amount)?;
    tx.commit()?;
    Ok(n)
}

/// Bulk insert without the round-up side effect: `round_up` stays zero
/// and no goal is touched, whatever the amounts. All-or-nothing: a bad
/// record rolls back the whole batch.
pub fn ingest_batch(conn: &mut Connection, items: &[NewTransaction]) -> Result<usize> {
    for item in items {
        if item.amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount(item.amount).into());
        }
    }
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO transactions(amount, description, date, category_id, type, is_ai_generated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for item in items {
            stmt.execute(params![
                item.amount.to_string(),
                item.description,
                item.date.to_string(),
                item.category_id,
                item.kind.as_str(),
                item.is_ai_generated as i64
            ])?;
        }
    }
    tx.commit()?;
    Ok(items.len())
}

/// Set the budget for (category, month), updating in place when a row
/// already exists. At most one row per pair; the schema's UNIQUE
/// constraint backs the read-then-write. The month key is an explicit
/// input so the rule stays deterministic; callers resolve "now".
pub fn upsert_budget(
    conn: &mut Connection,
    category_id: i64,
    amount: Decimal,
    month: &str,
) -> Result<BudgetUpsert> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount(amount).into());
    }
    let tx = conn.transaction()?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM budgets WHERE category_id=?1 AND month=?2",
            params![category_id, month],
            |r| r.get(0),
        )
        .optional()?;
    let result = match existing {
        Some(id) => {
            tx.execute(
                "UPDATE budgets SET amount=?1 WHERE id=?2",
                params![amount.to_string(), id],
            )?;
            BudgetUpsert { id, updated: true }
        }
        None => {
            tx.execute(
                "INSERT INTO budgets(category_id, amount, month) VALUES (?1, ?2, ?3)",
                params![category_id, amount.to_string(), month],
            )?;
            BudgetUpsert {
                id: tx.last_insert_rowid(),
                updated: false,
            }
        }
    };
    tx.commit()?;
    Ok(result)
}

/// One schedule step: calendar month (day clamped to month length), seven
/// days, or calendar year.
pub fn advance_next_date(frequency: Frequency, date: NaiveDate) -> Result<NaiveDate> {
    let next = match frequency {
        Frequency::Weekly => date.checked_add_signed(Duration::days(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
        Frequency::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| ValidationError::DateOverflow(date).into())
}

/// Materialize every due subscription (`next_date <= today`) as a
/// transaction dated today and advance its schedule by exactly one
/// period. A row overdue by several periods steps forward once per sweep
/// and stays due for the next one. Each row's transaction insert and
/// schedule advance commit together; a failing row is recorded and the
/// sweep moves on.
pub fn sweep_subscriptions(conn: &mut Connection, today: NaiveDate) -> Result<SweepOutcome> {
    let due = due_rows(conn, today)?;
    let mut outcome = SweepOutcome::default();
    for raw in due {
        let id = raw.id;
        let step = parse_row(raw).and_then(|sub| roll_forward(conn, &sub, today));
        match step {
            Ok(()) => outcome.processed += 1,
            Err(e) => outcome.skipped.push((id, format!("{e:#}"))),
        }
    }
    Ok(outcome)
}

struct RawSubscription {
    id: i64,
    name: String,
    amount: String,
    category_id: Option<i64>,
    frequency: String,
    next_date: String,
    kind: String,
}

fn due_rows(conn: &Connection, today: NaiveDate) -> Result<Vec<RawSubscription>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, amount, category_id, frequency, next_date, type
         FROM subscriptions WHERE next_date <= ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![today.to_string()], |r| {
        Ok(RawSubscription {
            id: r.get(0)?,
            name: r.get(1)?,
            amount: r.get(2)?,
            category_id: r.get(3)?,
            frequency: r.get(4)?,
            next_date: r.get(5)?,
            kind: r.get(6)?,
        })
    })?;
    let mut due = Vec::new();
    for row in rows {
        due.push(row?);
    }
    Ok(due)
}

// Malformed columns fail this row only; the sweep skips it and goes on.
fn parse_row(raw: RawSubscription) -> Result<Subscription> {
    Ok(Subscription {
        id: raw.id,
        name: raw.name,
        amount: raw.amount.parse::<Decimal>().with_context(|| {
            format!("Invalid amount '{}' on subscription {}", raw.amount, raw.id)
        })?,
        category_id: raw.category_id,
        frequency: Frequency::parse(&raw.frequency)
            .ok_or_else(|| ValidationError::UnknownFrequency(raw.frequency.clone()))?,
        next_date: NaiveDate::parse_from_str(&raw.next_date, "%Y-%m-%d").with_context(|| {
            format!("Invalid next_date '{}' on subscription {}", raw.next_date, raw.id)
        })?,
        kind: TxKind::parse(&raw.kind)
            .ok_or_else(|| ValidationError::UnknownKind(raw.kind.clone()))?,
    })
}

fn roll_forward(conn: &mut Connection, sub: &Subscription, today: NaiveDate) -> Result<()> {
    let next = advance_next_date(sub.frequency, sub.next_date)?;
    let tx = conn.transaction()?;
    // Materialized payments bypass the round-up engine entirely.
    tx.execute(
        "INSERT INTO transactions(amount, description, date, category_id, type, is_ai_generated)
         VALUES (?1, ?2, ?3, ?4, ?5, 0)",
        params![
            sub.amount.to_string(),
            sub.name,
            today.to_string(),
            sub.category_id,
            sub.kind.as_str()
        ],
    )
    .with_context(|| format!("Materialize subscription {}", sub.id))?;
    tx.execute(
        "UPDATE subscriptions SET next_date=?1 WHERE id=?2",
        params![next.to_string(), sub.id],
    )
    .with_context(|| format!("Advance subscription {}", sub.id))?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn monthly_advance_clamps_to_month_end() {
        let next = advance_next_date(Frequency::Monthly, d("2024-01-31")).unwrap();
        assert_eq!(next, d("2024-02-29"));
        let next = advance_next_date(Frequency::Monthly, d("2023-01-31")).unwrap();
        assert_eq!(next, d("2023-02-28"));
    }

    #[test]
    fn weekly_and_yearly_advance() {
        assert_eq!(
            advance_next_date(Frequency::Weekly, d("2024-02-26")).unwrap(),
            d("2024-03-04")
        );
        assert_eq!(
            advance_next_date(Frequency::Yearly, d("2024-05-10")).unwrap(),
            d("2025-05-10")
        );
    }

    #[test]
    fn round_up_is_pure() {
        let a = Decimal::new(4712, 2); // 47.12
        assert_eq!(
            round_up_for(TxKind::Expense, a).unwrap(),
            round_up_for(TxKind::Expense, a).unwrap()
        );
    }

    #[test]
    fn round_up_rejects_amounts_near_decimal_max() {
        assert!(round_up_for(TxKind::Expense, Decimal::MAX).is_err());
        // Income has no rounding to overflow.
        assert_eq!(round_up_for(TxKind::Income, Decimal::MAX).unwrap(), Decimal::ZERO);
    }
}
