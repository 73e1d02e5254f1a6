// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use kumbara::{cli, commands, db, rules, utils};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let mut conn = db::open_or_init()?;

    // Catch-up sweep before any command runs, so overdue subscription
    // payments are on the books before anything reads them.
    let outcome = rules::sweep_subscriptions(&mut conn, utils::today())?;
    for (id, err) in &outcome.skipped {
        eprintln!("warning: subscription {} skipped during sweep: {}", id, err);
    }
    if outcome.processed > 0 {
        eprintln!("{} due subscription(s) recorded", outcome.processed);
    }

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("category", sub)) => commands::categories::handle(&conn, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, sub)?,
        Some(("budget", sub)) => commands::budgets::handle(&mut conn, sub)?,
        Some(("goal", sub)) => commands::goals::handle(&mut conn, sub)?,
        Some(("sub", sub)) => commands::subscriptions::handle(&mut conn, sub)?,
        Some(("summary", sub)) => commands::summary::handle(&conn, sub)?,
        Some(("insights", _)) => commands::insights::handle(&conn)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
