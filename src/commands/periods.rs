// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store;
use crate::utils::{fmt_opt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let sheet = sub.get_one::<String>("sheet").unwrap().trim();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let from = sub
        .get_one::<String>("from")
        .map(|s| parse_month(s.trim()))
        .transpose()?;
    let to = sub
        .get_one::<String>("to")
        .map(|s| parse_month(s.trim()))
        .transpose()?;

    let records = store::periods_for_sheet(conn, sheet, from, to)?;
    if maybe_print_json(json_flag, jsonl_flag, &records)? {
        return Ok(());
    }

    let rows = records
        .into_iter()
        .map(|r| {
            vec![
                r.as_of_date.to_string(),
                fmt_opt_money(r.values.beginning_balance),
                fmt_opt_money(r.values.ending_balance),
                fmt_opt_money(r.values.unrealized_gain_loss),
                fmt_opt_money(r.values.realized_gain_loss),
                fmt_opt_money(r.values.management_fees),
                r.source,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["As Of", "Beginning", "Ending", "Unrealized", "Realized", "Fees", "Source"],
            rows
        )
    );
    Ok(())
}
