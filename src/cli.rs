// Copyright (c) 2025 Kumbara.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

pub fn build_cli() -> Command {
    Command::new("kumbara")
        .about("Personal finance tracker: round-up savings, budgets, subscriptions, goals")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand(Command::new("init").about("Initialize the database"))
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .help("income|expense"),
                        )
                        .arg(Arg::new("icon").long("icon"))
                        .arg(Arg::new("color").long("color")),
                )
                .subcommand(json_flags(Command::new("list").about("List categories"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Record and inspect transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction (expenses divert round-up change to a goal)")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .help("income|expense"),
                        )
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                        .arg(Arg::new("desc").long("desc"))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("ai")
                                .long("ai")
                                .action(ArgAction::SetTrue)
                                .help("Mark as AI-generated"),
                        ),
                )
                .subcommand(
                    json_flags(Command::new("list").about("List transactions"))
                        .arg(Arg::new("month").long("month").help("Filter by YYYY-MM"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )
                .subcommand(
                    Command::new("rm").about("Delete a transaction").arg(
                        Arg::new("id")
                            .long("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                )
                .subcommand(
                    Command::new("import")
                        .about("Batch-import transactions from a JSON or CSV file (no round-up)")
                        .arg(Arg::new("path").long("path").required(true)),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category budgets")
                .subcommand(
                    Command::new("set")
                        .about("Set the budget for a category (updates in place if present)")
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to current")),
                )
                .subcommand(
                    json_flags(Command::new("list").about("List budgets"))
                        .arg(Arg::new("month").long("month").help("Filter by YYYY-MM")),
                ),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .about("Add a savings goal")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("target").long("target").required(true))
                        .arg(Arg::new("deadline").long("deadline").help("YYYY-MM-DD"))
                        .arg(Arg::new("color").long("color"))
                        .arg(Arg::new("icon").long("icon")),
                )
                .subcommand(json_flags(Command::new("list").about("List goals with progress")))
                .subcommand(
                    Command::new("contribute")
                        .about("Add to a goal's saved amount (negative withdraws)")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64)),
                        )
                        .arg(Arg::new("amount").long("amount").required(true)),
                ),
        )
        .subcommand(
            Command::new("sub")
                .about("Recurring subscriptions")
                .subcommand(
                    Command::new("add")
                        .about("Add a subscription")
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("frequency")
                                .long("frequency")
                                .required(true)
                                .help("weekly|monthly|yearly"),
                        )
                        .arg(
                            Arg::new("next")
                                .long("next")
                                .required(true)
                                .help("First due date, YYYY-MM-DD"),
                        )
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .default_value("expense")
                                .help("income|expense"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("List subscriptions")))
                .subcommand(
                    Command::new("sweep")
                        .about("Materialize due subscriptions and advance their schedule"),
                ),
        )
        .subcommand(
            json_flags(Command::new("summary").about("Income/expense totals for a month"))
                .arg(Arg::new("month").long("month").help("YYYY-MM, defaults to current")),
        )
        .subcommand(
            Command::new("insights")
                .about("Ask the configured AI service for spending advice (needs GEMINI_API_KEY)"),
        )
        .subcommand(Command::new("doctor").about("Check the store for invariant violations"))
}
