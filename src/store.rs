// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::basis::Basis;
use crate::dates::{month_end, parse_date, prev_month_end};
use crate::grid::Cell;
use crate::metrics::{self, TimeSpan};
use crate::models::{OverviewResult, PeriodRecord, PeriodValues};
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

const UPSERT_SQL: &str = "INSERT INTO period_metrics(
        sheet, as_of_date, beginning_balance, ending_balance,
        unrealized_gain_loss, realized_gain_loss, management_fees, source)
     VALUES (?1,?2,?3,?4,?5,?6,?7,?8)
     ON CONFLICT(sheet, as_of_date) DO UPDATE SET
        beginning_balance=excluded.beginning_balance,
        ending_balance=excluded.ending_balance,
        unrealized_gain_loss=excluded.unrealized_gain_loss,
        realized_gain_loss=excluded.realized_gain_loss,
        management_fees=excluded.management_fees,
        source=excluded.source,
        updated_at=datetime('now')";

fn text(v: Option<Decimal>) -> Option<String> {
    v.map(|d| d.to_string())
}

/// Insert-or-update one monthly record. Conflict resolution overwrites every
/// financial field and `updated_at` but leaves `created_at` alone, so
/// repeated ingestion of the same month is idempotent.
pub fn upsert_period(conn: &Connection, rec: &PeriodRecord) -> Result<()> {
    conn.execute(
        UPSERT_SQL,
        params![
            rec.sheet,
            rec.as_of_date.to_string(),
            text(rec.values.beginning_balance),
            text(rec.values.ending_balance),
            text(rec.values.unrealized_gain_loss),
            text(rec.values.realized_gain_loss),
            text(rec.values.management_fees),
            rec.source,
        ],
    )?;
    Ok(())
}

/// Upsert a batch in one transaction (single commit, like any other import).
pub fn upsert_periods(conn: &mut Connection, records: &[PeriodRecord]) -> Result<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare_cached(UPSERT_SQL)?;
        for rec in records {
            stmt.execute(params![
                rec.sheet,
                rec.as_of_date.to_string(),
                text(rec.values.beginning_balance),
                text(rec.values.ending_balance),
                text(rec.values.unrealized_gain_loss),
                text(rec.values.realized_gain_loss),
                text(rec.values.management_fees),
                rec.source,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn parse_money(raw: Option<String>, sheet: &str, field: &str) -> Result<Option<Decimal>> {
    raw.map(|s| {
        s.parse::<Decimal>()
            .with_context(|| format!("Invalid stored {} '{}' for sheet {}", field, s, sheet))
    })
    .transpose()
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, String, [Option<String>; 5], String)> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        [row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
        row.get(7)?,
    ))
}

fn materialize(
    (sheet, date_s, money, source): (String, String, [Option<String>; 5], String),
) -> Result<PeriodRecord> {
    let as_of_date = parse_date(&Cell::Text(date_s.clone()))
        .ok_or_else(|| anyhow!("Invalid stored as_of_date '{}' for sheet {}", date_s, sheet))?;
    let [beg, end, unrl, rlzd, fees] = money;
    let values = PeriodValues {
        beginning_balance: parse_money(beg, &sheet, "beginning_balance")?,
        ending_balance: parse_money(end, &sheet, "ending_balance")?,
        unrealized_gain_loss: parse_money(unrl, &sheet, "unrealized_gain_loss")?,
        realized_gain_loss: parse_money(rlzd, &sheet, "realized_gain_loss")?,
        management_fees: parse_money(fees, &sheet, "management_fees")?,
    };
    Ok(PeriodRecord {
        sheet,
        as_of_date,
        values,
        source,
    })
}

const SELECT_FIELDS: &str = "sheet, as_of_date, beginning_balance, ending_balance,
     unrealized_gain_loss, realized_gain_loss, management_fees, source";

/// Stored monthly records for a sheet, oldest first, optionally bounded.
/// Dates are stored ISO so string comparison orders correctly.
pub fn periods_for_sheet(
    conn: &Connection,
    sheet: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<PeriodRecord>> {
    let lo = from.map(|d| d.to_string()).unwrap_or_else(|| "0000-01-01".into());
    let hi = to.map(|d| d.to_string()).unwrap_or_else(|| "9999-12-31".into());
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM period_metrics
         WHERE sheet=?1 AND as_of_date>=?2 AND as_of_date<=?3
         ORDER BY as_of_date",
        SELECT_FIELDS
    ))?;
    let rows = stmt.query_map(params![sheet, lo, hi], record_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(materialize(row?)?);
    }
    Ok(out)
}

fn period_at(conn: &Connection, sheet: &str, as_of: NaiveDate) -> Result<Option<PeriodRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM period_metrics WHERE sheet=?1 AND as_of_date=?2",
        SELECT_FIELDS
    ))?;
    let found = stmt
        .query_row(params![sheet, as_of.to_string()], record_from_row)
        .optional()?;
    found.map(materialize).transpose()
}

/// Store-backed overview across every stored month: initial is the earliest
/// closing balance, current the latest. `None` when the sheet has no rows.
pub fn overview_span(conn: &Connection, sheet: &str) -> Result<Option<OverviewResult>> {
    let rows = periods_for_sheet(conn, sheet, None, None)?;
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return Ok(None);
    };
    let initial = first.values.ending_balance.unwrap_or(Decimal::ZERO);
    let current = last.values.ending_balance.unwrap_or(Decimal::ZERO);
    let kpis = metrics::compute(initial, current, first.as_of_date, last.as_of_date);
    Ok(Some(OverviewResult {
        sheet: sheet.to_string(),
        basis: Basis::Inception,
        period_end: last.as_of_date,
        initial_value: initial,
        current_value: current,
        moic: kpis.moic,
        roi_pct: kpis.roi_pct,
        irr_pct: kpis.irr_pct,
        time_span: TimeSpan::new(first.as_of_date, last.as_of_date),
        source: "store".to_string(),
    }))
}

/// Store-backed overview for one month. A missing beginning balance falls
/// back to the prior month's closing balance.
pub fn overview_month(
    conn: &Connection,
    sheet: &str,
    period_end: NaiveDate,
) -> Result<Option<OverviewResult>> {
    let as_of = month_end(period_end);
    let Some(row) = period_at(conn, sheet, as_of)? else {
        return Ok(None);
    };
    let initial = match row.values.beginning_balance {
        Some(v) => v,
        None => period_at(conn, sheet, prev_month_end(as_of))?
            .and_then(|prev| prev.values.ending_balance)
            .unwrap_or(Decimal::ZERO),
    };
    let current = row.values.ending_balance.unwrap_or(Decimal::ZERO);
    let kpis = metrics::compute(initial, current, as_of, as_of);
    Ok(Some(OverviewResult {
        sheet: sheet.to_string(),
        basis: Basis::Month,
        period_end: as_of,
        initial_value: initial,
        current_value: current,
        moic: kpis.moic,
        roi_pct: kpis.roi_pct,
        irr_pct: kpis.irr_pct,
        time_span: TimeSpan::new(as_of, as_of),
        source: "store".to_string(),
    }))
}
