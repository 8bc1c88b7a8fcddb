// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use fundsheet::{cli, commands, db};

fn main() -> Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("init", _)) => {
            db::open_or_init()?;
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("ingest", sub)) => {
            let mut conn = db::open_or_init()?;
            commands::ingest::handle(&mut conn, sub)?;
        }
        Some(("overview", sub)) => {
            let mut conn = db::open_or_init()?;
            commands::overview::handle(&mut conn, sub)?;
        }
        Some(("periods", sub)) => {
            let conn = db::open_or_init()?;
            commands::periods::handle(&conn, sub)?;
        }
        Some(("sheets", sub)) => commands::sheets::handle(sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
