// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("app.kumbara", "Kumbara", "kumbara"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("kumbara.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// Idempotent schema setup. Public so tests can run it against an
/// in-memory connection.
pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        icon TEXT,
        color TEXT
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        amount TEXT NOT NULL,
        description TEXT,
        date TEXT NOT NULL,
        category_id INTEGER,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        is_ai_generated INTEGER NOT NULL DEFAULT 0,
        round_up TEXT NOT NULL DEFAULT '0',
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);

    -- UNIQUE(category_id, month) backs the one-budget-per-category-per-month
    -- invariant; the upsert itself still goes read-then-write.
    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        category_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        month TEXT NOT NULL, -- YYYY-MM
        UNIQUE(category_id, month),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS subscriptions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        category_id INTEGER,
        frequency TEXT NOT NULL CHECK(frequency IN ('weekly','monthly','yearly')),
        next_date TEXT NOT NULL,
        type TEXT NOT NULL DEFAULT 'expense' CHECK(type IN ('income','expense')),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL
    );

    CREATE TABLE IF NOT EXISTS goals(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL DEFAULT '0',
        deadline TEXT,
        color TEXT,
        icon TEXT
    );
    "#,
    )
    .context("Initialize schema")?;

    seed_default_categories(conn)?;
    Ok(())
}

/// Seed the fixed default category set the first time the schema comes up.
/// Append-only after that; an already-populated table is left alone.
fn seed_default_categories(conn: &Connection) -> Result<()> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if count > 0 {
        return Ok(());
    }
    let defaults: &[(&str, &str, &str, &str)] = &[
        ("Maaş", "income", "Wallet", "#10b981"),
        ("Ek Gelir", "income", "PlusCircle", "#34d399"),
        ("Gıda", "expense", "Utensils", "#f59e0b"),
        ("Kira", "expense", "Home", "#3b82f6"),
        ("Ulaşım", "expense", "Car", "#6366f1"),
        ("Eğlence", "expense", "Music", "#ec4899"),
        ("Sağlık", "expense", "HeartPulse", "#ef4444"),
        ("Alışveriş", "expense", "ShoppingBag", "#f97316"),
        ("Faturalar", "expense", "Zap", "#eab308"),
        ("Diğer", "expense", "MoreHorizontal", "#94a3b8"),
    ];
    let mut stmt =
        conn.prepare("INSERT INTO categories(name, type, icon, color) VALUES (?1, ?2, ?3, ?4)")?;
    for (name, kind, icon, color) in defaults {
        stmt.execute((name, kind, icon, color))?;
    }
    Ok(())
}
