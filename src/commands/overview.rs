// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::basis::Basis;
use crate::commands::book::CsvBook;
use crate::dates::month_end;
use crate::engine;
use crate::models::{OverviewRequest, OverviewResult, PeriodRecord, PeriodValues};
use crate::store;
use crate::utils::{self, fmt_opt_ratio, maybe_print_json, pretty_table};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::Connection;

/// "YYYY-MM" or a full ISO date, normalized to the month-end.
fn parse_period_end(s: &str) -> Result<NaiveDate> {
    if s.len() == 7 {
        utils::parse_month(s)
    } else {
        utils::parse_date(s).map(month_end)
    }
}

pub fn handle(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let sheet = sub.get_one::<String>("sheet").unwrap().trim();
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let basis: Basis = sub
        .get_one::<String>("basis")
        .map(|s| s.parse())
        .transpose()?
        .unwrap_or(Basis::Inception);
    let period_end = sub
        .get_one::<String>("period-end")
        .map(|s| s.trim().to_string());
    let year = sub
        .get_one::<String>("year")
        .map(|s| {
            s.trim()
                .parse::<i32>()
                .with_context(|| format!("Invalid year '{}'", s))
        })
        .transpose()?;

    let result = if sub.get_flag("store") {
        overview_from_store(conn, sheet, period_end.as_deref())?
    } else {
        let dir = sub
            .get_one::<String>("book")
            .context("--book is required unless --store is set")?;
        let book = CsvBook::open(dir.trim())?;
        let (resolved, grid) = book.grid(sheet)?;
        let req = OverviewRequest {
            basis,
            period_end,
            year,
        };
        let result = engine::compute_overview(&grid, &resolved, &req)?;
        persist_on_read(conn, &result)?;
        result
    };

    if maybe_print_json(json_flag, jsonl_flag, &result)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Sheet".into(), result.sheet.clone()],
        vec!["Basis".into(), result.basis.to_string()],
        vec!["Period End".into(), result.period_end.to_string()],
        vec!["Initial Value".into(), format!("{:.2}", result.initial_value)],
        vec!["Current Value".into(), format!("{:.2}", result.current_value)],
        vec!["MOIC".into(), fmt_opt_ratio(result.moic)],
        vec!["ROI %".into(), fmt_opt_ratio(result.roi_pct)],
        vec!["IRR %".into(), fmt_opt_ratio(result.irr_pct)],
        vec![
            "Window".into(),
            format!(
                "{} .. {} ({} days)",
                result.time_span.start_date, result.time_span.end_date, result.time_span.days
            ),
        ],
        vec!["Source".into(), result.source.clone()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
    Ok(())
}

fn overview_from_store(
    conn: &Connection,
    sheet: &str,
    period_end: Option<&str>,
) -> Result<OverviewResult> {
    let found = match period_end {
        Some(pe) => store::overview_month(conn, sheet, parse_period_end(pe)?)?,
        None => store::overview_span(conn, sheet)?,
    };
    found.ok_or_else(|| anyhow!("No stored data for sheet '{}'", sheet))
}

/// Every computed overview lands its month totals in the store, so the
/// store answers the next read even when the workbook is gone.
fn persist_on_read(conn: &Connection, result: &OverviewResult) -> Result<()> {
    let rec = PeriodRecord {
        sheet: result.sheet.clone(),
        as_of_date: month_end(result.period_end),
        values: PeriodValues {
            beginning_balance: Some(result.initial_value),
            ending_balance: Some(result.current_value),
            ..Default::default()
        },
        source: "overview".to_string(),
    };
    store::upsert_period(conn, &rec)
}
