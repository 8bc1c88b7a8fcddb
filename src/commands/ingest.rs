// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::book::CsvBook;
use crate::engine;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let dir = sub.get_one::<String>("book").unwrap().trim();
    let sheet = sub.get_one::<String>("sheet").unwrap().trim();
    let source = sub
        .get_one::<String>("source")
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "csv-book".to_string());

    let book = CsvBook::open(dir)?;
    let (resolved, grid) = book.grid(sheet)?;
    let summary = engine::ingest(conn, &resolved, &grid, &source)?;

    let rows = summary
        .upserted
        .iter()
        .map(|d| vec![d.to_string()])
        .collect();
    println!("{}", pretty_table(&["Upserted Month"], rows));
    println!(
        "Ingested {} month(s) from sheet '{}' (header row {}, {} date column(s), {} unmapped)",
        summary.upserted.len(),
        summary.sheet,
        summary.header_row,
        summary.date_columns,
        summary.unmapped_columns
    );
    Ok(())
}
