// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::book::CsvBook;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(sub: &clap::ArgMatches) -> Result<()> {
    let dir = sub.get_one::<String>("book").unwrap().trim();
    let book = CsvBook::open(dir)?;
    let names = book.sheet_names()?;
    if names.is_empty() {
        println!("No sheet CSVs in {}", dir);
        return Ok(());
    }
    let rows = names.into_iter().map(|n| vec![n]).collect();
    println!("{}", pretty_table(&["Sheet"], rows));
    Ok(())
}
