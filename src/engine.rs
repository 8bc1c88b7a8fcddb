// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate;
use crate::basis;
use crate::dates::month_end;
use crate::detect::{self, DateAxis};
use crate::error::{EngineError, Result};
use crate::grid::Grid;
use crate::labels::{self, Metric};
use crate::metrics::{self, TimeSpan};
use crate::models::{IngestSummary, OverviewRequest, OverviewResult, PeriodRecord, PeriodValues};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Monthly totals extracted from one sheet, keyed by month-end date.
pub type PeriodMap = BTreeMap<NaiveDate, PeriodValues>;

#[derive(Debug, Default)]
struct ExtractStats {
    header_row: usize,
    date_columns: usize,
    mapped_columns: usize,
    unmapped_columns: usize,
    missing_label: usize,
}

/// Walk the grid into a monthly period map: detect the date axis, map each
/// date column to a metric, sum the investor block beneath that metric's
/// label row, then carry beginning balances forward.
pub fn extract_periods(grid: &Grid, sheet: &str) -> Result<PeriodMap> {
    extract_periods_inner(grid, sheet).map(|(map, _)| map)
}

fn extract_periods_inner(grid: &Grid, sheet: &str) -> Result<(PeriodMap, ExtractStats)> {
    let anchor = detect::find_label_row(grid, Metric::EndingBalance);
    let header = detect::detect(grid, anchor)?;
    let mut stats = ExtractStats {
        header_row: header.header_row,
        ..Default::default()
    };

    let mut map = PeriodMap::new();
    match &header.axis {
        DateAxis::Columns(date_cols) => {
            stats.date_columns = date_cols.len();
            let label_rows: BTreeMap<Metric, usize> = Metric::ALL
                .iter()
                .filter_map(|m| detect::find_label_row(grid, *m).map(|r| (*m, r)))
                .collect();
            let all_label_rows: Vec<usize> = label_rows.values().copied().collect();

            // Sum one metric's investor block at a date column. A label above
            // the date header means the block's rows start under the header,
            // not under the label. Sheets that write totals straight onto the
            // label row get read there when no rows sum beneath it.
            let header_row = header.header_row;
            let block_sum = |start_row: usize, col: usize| -> Option<Decimal> {
                let stop_row = all_label_rows
                    .iter()
                    .filter(|r| **r > start_row)
                    .min()
                    .copied();
                let from = start_row.max(header_row);
                aggregate::sum_rows(grid, from, col, stop_row)
                    .or_else(|| aggregate::parse_amount(grid.cell(start_row, col)))
            };

            let mut ending_located = label_rows.contains_key(&Metric::EndingBalance);
            for (&col, &date) in date_cols {
                let key = month_end(date);
                match detect::resolve_metric(grid, header.header_row, col) {
                    Some(metric) => {
                        if metric == Metric::EndingBalance {
                            ending_located = true;
                        }
                        let Some(&start_row) = label_rows.get(&metric) else {
                            stats.missing_label += 1;
                            continue;
                        };
                        map.entry(key).or_default().set(metric, block_sum(start_row, col));
                        stats.mapped_columns += 1;
                    }
                    None => {
                        // No caption in this column: the date column spans
                        // every labelled block (label rows live in the name
                        // column on these sheets).
                        stats.unmapped_columns += 1;
                        for (&metric, &start_row) in &label_rows {
                            if let Some(v) = block_sum(start_row, col) {
                                map.entry(key).or_default().set(metric, Some(v));
                            }
                        }
                    }
                }
            }
            if !ending_located {
                return Err(EngineError::NoMetricColumnFound {
                    metric: Metric::EndingBalance,
                });
            }
        }
        DateAxis::Control(date) => {
            // Single-date sheets are row-wise: metric captions head their
            // columns on the Ending Balance caption row, and the control
            // date applies to every investor row beneath it.
            let caption_row = anchor.ok_or(EngineError::NoMetricColumnFound {
                metric: Metric::EndingBalance,
            })?;
            let mut metric_cols: BTreeMap<Metric, usize> = BTreeMap::new();
            for c in 1..=grid.col_count() {
                if let Some(m) = labels::classify(&grid.cell(caption_row, c).to_text()) {
                    // Last occurrence wins when a caption repeats.
                    metric_cols.insert(m, c);
                }
            }
            if !metric_cols.contains_key(&Metric::EndingBalance) {
                return Err(EngineError::NoMetricColumnFound {
                    metric: Metric::EndingBalance,
                });
            }
            stats.date_columns = 1;
            let values = map.entry(month_end(*date)).or_default();
            for (metric, col) in metric_cols {
                values.set(metric, aggregate::sum_rows(grid, caption_row, col, None));
                stats.mapped_columns += 1;
            }
        }
    }

    map.retain(|_, v| !v.is_empty());
    if map.values().all(|v| v.ending_balance.is_none()) {
        return Err(EngineError::NoNumericRows {
            sheet: sheet.to_string(),
        });
    }

    carry_forward(&mut map);
    debug!(
        "extracted {} month(s) from sheet '{}' (header row {})",
        map.len(),
        sheet,
        stats.header_row
    );
    Ok((map, stats))
}

/// This period's opening balance equals last period's closing balance when
/// the source sheet omits a redundant beginning column.
fn carry_forward(map: &mut PeriodMap) {
    let keys: Vec<NaiveDate> = map.keys().copied().collect();
    for key in keys {
        if map[&key].beginning_balance.is_some() {
            continue;
        }
        let carried = map
            .range(..key)
            .rev()
            .find_map(|(_, v)| v.ending_balance);
        if carried.is_some() {
            map.get_mut(&key).expect("key present").beginning_balance = carried;
        }
    }
}

/// Latest month-end key belonging to the same calendar month as `end`,
/// else the latest key at-or-before it, else the earliest key.
fn effective_end_key(map: &PeriodMap, end: NaiveDate) -> NaiveDate {
    map.keys()
        .rev()
        .find(|k| k.year() == end.year() && k.month() == end.month())
        .or_else(|| map.range(..=end).next_back().map(|(k, _)| k))
        .or_else(|| map.keys().next())
        .copied()
        .expect("non-empty period map")
}

fn prior_ending(map: &PeriodMap, before: NaiveDate) -> Option<Decimal> {
    map.range(..before).rev().find_map(|(_, v)| v.ending_balance)
}

fn earliest_ending(map: &PeriodMap) -> Option<Decimal> {
    map.values().find_map(|v| v.ending_balance)
}

/// Pick initial/current values for a resolved window and derive the KPIs.
pub fn overview_from_periods(
    map: &PeriodMap,
    sheet: &str,
    req: &OverviewRequest,
    source: &str,
) -> Result<OverviewResult> {
    let dates: Vec<NaiveDate> = map.keys().copied().collect();
    let (start, end) = basis::resolve_window(&dates, req.basis, req.period_end.as_deref(), req.year)?;
    let eff = req.basis.effective();

    let end_key = effective_end_key(map, end);
    let current = map[&end_key].ending_balance.unwrap_or(Decimal::ZERO);

    let initial = if req.basis.is_single_point() {
        map[&end_key]
            .beginning_balance
            .or_else(|| prior_ending(map, end_key))
            .or_else(|| earliest_ending(map))
            .unwrap_or(Decimal::ZERO)
    } else {
        map.range(start..)
            .find_map(|(_, v)| v.beginning_balance)
            .or_else(|| prior_ending(map, start))
            .or_else(|| earliest_ending(map))
            .unwrap_or(Decimal::ZERO)
    };

    let kpis = metrics::compute(initial, current, start, end);
    Ok(OverviewResult {
        sheet: sheet.to_string(),
        basis: eff,
        period_end: end_key,
        initial_value: initial,
        current_value: current,
        moic: kpis.moic,
        roi_pct: kpis.roi_pct,
        irr_pct: kpis.irr_pct,
        time_span: TimeSpan::new(start, end),
        source: source.to_string(),
    })
}

/// Full grid-to-result computation for one request.
pub fn compute_overview(grid: &Grid, sheet: &str, req: &OverviewRequest) -> Result<OverviewResult> {
    let map = extract_periods(grid, sheet)?;
    overview_from_periods(&map, sheet, req, "grid")
}

/// Extract every month from the grid and upsert it into the period store.
/// Re-running with identical source data is a no-op beyond `updated_at`.
pub fn ingest(
    conn: &mut rusqlite::Connection,
    sheet: &str,
    grid: &Grid,
    source: &str,
) -> anyhow::Result<IngestSummary> {
    let (map, stats) = extract_periods_inner(grid, sheet)?;

    let records: Vec<PeriodRecord> = map
        .into_iter()
        .map(|(as_of_date, values)| PeriodRecord {
            sheet: sheet.to_string(),
            as_of_date,
            values,
            source: source.to_string(),
        })
        .collect();
    crate::store::upsert_periods(conn, &records)?;

    let summary = IngestSummary {
        sheet: sheet.to_string(),
        header_row: stats.header_row,
        date_columns: stats.date_columns,
        mapped_columns: stats.mapped_columns,
        unmapped_columns: stats.unmapped_columns,
        missing_label: stats.missing_label,
        upserted: records.iter().map(|r| r.as_of_date).collect(),
    };
    info!(
        "ingest: sheet={} header_row={} date_cols={} mapped={} unmapped={} missing_label={} upserted={}",
        summary.sheet,
        summary.header_row,
        summary.date_columns,
        summary.mapped_columns,
        summary.unmapped_columns,
        summary.missing_label,
        summary.upserted.len()
    );
    Ok(summary)
}

/// Derived-result cache keyed by workbook identity plus the full request,
/// invalidated when the workbook's modification token changes. Injected by
/// the caller; there is no ambient cache state.
#[derive(Debug, Default)]
pub struct OverviewCache {
    entries: HashMap<(String, String, String), (String, OverviewResult)>,
}

impl OverviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(identity: &str, sheet: &str, req: &OverviewRequest) -> (String, String, String) {
        let req_key = format!(
            "{}|{}|{}",
            req.basis,
            req.period_end.as_deref().unwrap_or(""),
            req.year.map(|y| y.to_string()).unwrap_or_default()
        );
        (identity.to_string(), sheet.to_string(), req_key)
    }

    /// A hit requires the stored modification token to match.
    pub fn get(
        &self,
        identity: &str,
        sheet: &str,
        req: &OverviewRequest,
        token: &str,
    ) -> Option<&OverviewResult> {
        self.entries
            .get(&Self::key(identity, sheet, req))
            .filter(|(stored, _)| stored == token)
            .map(|(_, result)| result)
    }

    pub fn put(
        &mut self,
        identity: &str,
        sheet: &str,
        req: &OverviewRequest,
        token: &str,
        result: OverviewResult,
    ) {
        self.entries
            .insert(Self::key(identity, sheet, req), (token.to_string(), result));
    }
}
