// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::dates::{month_end, parse_sane_date};
use crate::error::{EngineError, Result};
use crate::grid::{Cell, Grid};
use crate::labels::{self, Metric};
use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// How the sheet maps periods to cells.
#[derive(Debug, Clone, PartialEq)]
pub enum DateAxis {
    /// Dates run across the header row; each mapped column is one period.
    Columns(BTreeMap<usize, NaiveDate>),
    /// One date found in the sheet applies to every data row.
    Control(NaiveDate),
}

/// Result of header detection for one (grid, sheet). Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderMap {
    pub header_row: usize,
    pub axis: DateAxis,
}

const HEADER_SCAN_ROWS: usize = 200;
const LABEL_SCAN_ROWS: usize = 250;
const BANNER_SCAN_ROWS: usize = 6;
const CONTROL_SCAN_ROWS: usize = 40;

/// Rows probed above/below the header when mapping a column to a metric.
const METRIC_LOOKAROUND: usize = 12;

/// Detect the header row and date axis, trying each strategy in order:
/// per-row date cells, month-name tokens under a year banner, then a single
/// control date. `anchor_row` (typically the Ending Balance label row) steers
/// the first strategy towards the totals block.
pub fn detect(grid: &Grid, anchor_row: Option<usize>) -> Result<HeaderMap> {
    let strategies: [(&str, fn(&Grid, Option<usize>) -> Option<HeaderMap>); 3] = [
        ("date-header", date_header_strategy),
        ("month-banner", month_banner_strategy),
        ("control-date", control_date_strategy),
    ];
    for (name, strategy) in strategies {
        if let Some(found) = strategy(grid, anchor_row) {
            debug!(
                "header detection: strategy '{}' matched at row {}",
                name, found.header_row
            );
            return Ok(found);
        }
        debug!("header detection: strategy '{}' found nothing", name);
    }
    let rows_scanned = grid.row_count().min(HEADER_SCAN_ROWS);
    if anchor_row.is_some() {
        Err(EngineError::NoDateColumnFound { rows_scanned })
    } else {
        Err(EngineError::NoHeaderDetected { rows_scanned })
    }
}

/// A row qualifies when at least two of its cells parse as sane dates. With
/// an anchor, the nearest qualifying row at-or-above it wins; otherwise the
/// row with the most date cells, ties to the topmost.
fn date_header_strategy(grid: &Grid, anchor_row: Option<usize>) -> Option<HeaderMap> {
    let rows = grid.row_count().min(HEADER_SCAN_ROWS);
    let cols = grid.col_count();
    let mut candidates: Vec<(usize, BTreeMap<usize, NaiveDate>)> = Vec::new();
    for r in 1..=rows {
        let mut local = BTreeMap::new();
        for c in 1..=cols {
            if let Some(d) = parse_sane_date(grid.cell(r, c)) {
                local.insert(c, d);
            }
        }
        if local.len() >= 2 {
            candidates.push((r, local));
        }
    }
    if candidates.is_empty() {
        return None;
    }
    if let Some(anchor) = anchor_row {
        let mut above: Vec<_> = candidates.iter().filter(|(r, _)| *r <= anchor).collect();
        if !above.is_empty() {
            above.sort_by_key(|(r, m)| (anchor - r, usize::MAX - m.len()));
            let (r, m) = above[0];
            return Some(HeaderMap {
                header_row: *r,
                axis: DateAxis::Columns(m.clone()),
            });
        }
    }
    candidates.sort_by_key(|(r, m)| (usize::MAX - m.len(), *r));
    let (r, m) = candidates.swap_remove(0);
    Some(HeaderMap {
        header_row: r,
        axis: DateAxis::Columns(m),
    })
}

static MONTHS: Lazy<Vec<(&'static str, u32)>> = Lazy::new(|| {
    vec![
        ("jan", 1), ("january", 1),
        ("feb", 2), ("february", 2),
        ("mar", 3), ("march", 3),
        ("apr", 4), ("april", 4),
        ("may", 5),
        ("jun", 6), ("june", 6),
        ("jul", 7), ("july", 7),
        ("aug", 8), ("august", 8),
        ("sep", 9), ("sept", 9), ("september", 9),
        ("oct", 10), ("october", 10),
        ("nov", 11), ("november", 11),
        ("dec", 12), ("december", 12),
    ]
});

fn month_token(text: &str) -> Option<u32> {
    let norm = labels::normalize(text);
    MONTHS.iter().find(|(t, _)| *t == norm).map(|(_, m)| *m)
}

static YEAR_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^20\d{2}$").expect("valid year pattern"));
static YEAR_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(20\d{2})\b").expect("valid year pattern"));

/// Year banners: a lone 2000–2099 number, or a caption carrying one, in the
/// top few rows. Keyed by column; first sighting per column wins.
fn detect_year_banners(grid: &Grid) -> BTreeMap<usize, i32> {
    let mut by_col = BTreeMap::new();
    let rows = grid.row_count().min(BANNER_SCAN_ROWS);
    for r in 1..=rows {
        for c in 1..=grid.col_count() {
            let Cell::Text(raw) = grid.cell(r, c) else {
                continue;
            };
            let norm = labels::normalize(raw);
            if norm.is_empty() {
                continue;
            }
            if YEAR_ONLY.is_match(&norm) {
                by_col.entry(c).or_insert_with(|| norm.parse().unwrap_or(0));
            } else if norm.chars().any(|ch| ch.is_ascii_alphabetic()) {
                if let Some(cap) = YEAR_IN_TEXT.captures(&norm) {
                    if let Ok(y) = cap[1].parse() {
                        by_col.entry(c).or_insert(y);
                    }
                }
            }
        }
    }
    by_col
}

/// A row of month-name tokens plus a year banner above the grid. Each month
/// column takes the banner at-or-left of it (sweeping left to right), falling
/// back to the nearest banner on its right; columns with no year in reach are
/// dropped. Synthesized dates are month-ends.
fn month_banner_strategy(grid: &Grid, _anchor_row: Option<usize>) -> Option<HeaderMap> {
    let banners = detect_year_banners(grid);
    if banners.is_empty() {
        return None;
    }

    let rows = grid.row_count().min(HEADER_SCAN_ROWS);
    let cols = grid.col_count();
    let mut best: Option<(usize, Vec<(usize, u32)>)> = None;
    for r in 1..=rows {
        let months: Vec<(usize, u32)> = (1..=cols)
            .filter_map(|c| month_token(&grid.cell(r, c).to_text()).map(|m| (c, m)))
            .collect();
        if months.len() >= 2 && best.as_ref().map(|(_, b)| months.len() > b.len()).unwrap_or(true) {
            best = Some((r, months));
        }
    }
    let (header_row, months) = best?;

    let nearest_right = |col: usize| -> Option<i32> {
        banners
            .range((col + 1)..)
            .next()
            .map(|(_, y)| *y)
    };
    let mut out = BTreeMap::new();
    let mut current_year: Option<i32> = None;
    let mut month_iter = months.iter().peekable();
    for c in 1..=cols {
        if let Some(y) = banners.get(&c) {
            current_year = Some(*y);
        }
        if let Some(&&(mc, m)) = month_iter.peek() {
            if mc == c {
                month_iter.next();
                if let Some(y) = current_year.or_else(|| nearest_right(c)) {
                    if let Some(first) = NaiveDate::from_ymd_opt(y, m, 1) {
                        out.insert(c, month_end(first));
                    }
                }
            }
        }
    }
    if out.is_empty() {
        return None;
    }
    Some(HeaderMap {
        header_row,
        axis: DateAxis::Columns(out),
    })
}

/// Captions that mark a date cell as the sheet's as-of date.
const DATEISH_CAPTIONS: &[&str] = &["as of", "as of date", "date", "period", "month", "ending date"];

/// Single-date-axis sheets: one sane date somewhere near the top applies to
/// every data row. Prefer a date with a date-ish caption within two columns;
/// otherwise take the latest sane date in the scanned region.
fn control_date_strategy(grid: &Grid, _anchor_row: Option<usize>) -> Option<HeaderMap> {
    let rows = grid.row_count().min(CONTROL_SCAN_ROWS);
    let cols = grid.col_count();
    let mut latest: Option<(usize, NaiveDate)> = None;
    for r in 1..=rows {
        for c in 1..=cols {
            let Some(d) = parse_sane_date(grid.cell(r, c)) else {
                continue;
            };
            let lo = c.saturating_sub(2).max(1);
            let captioned = (lo..=c + 2).any(|cc| {
                cc != c && DATEISH_CAPTIONS.contains(&labels::normalize(&grid.cell(r, cc).to_text()).as_str())
            });
            if captioned {
                return Some(HeaderMap {
                    header_row: r,
                    axis: DateAxis::Control(d),
                });
            }
            match latest {
                Some((_, best)) if best >= d => {}
                _ => latest = Some((r, d)),
            }
        }
    }
    latest.map(|(r, d)| HeaderMap {
        header_row: r,
        axis: DateAxis::Control(d),
    })
}

/// Which metric a date column belongs to: probe rows at increasing distance
/// above and below the header at that column and take the first caption that
/// classifies. Labels drift several rows from the date header when header
/// blocks are merged or wrapped.
pub fn resolve_metric(grid: &Grid, header_row: usize, col: usize) -> Option<Metric> {
    for d in 0..=METRIC_LOOKAROUND {
        let above = header_row.checked_sub(d).filter(|r| *r >= 1);
        let below = if d == 0 { None } else { Some(header_row + d) };
        for r in [above, below].into_iter().flatten() {
            if let Some(m) = labels::classify(&grid.cell(r, col).to_text()) {
                return Some(m);
            }
        }
    }
    None
}

/// First row (topmost) containing a caption classifying as `metric`.
pub fn find_label_row(grid: &Grid, metric: Metric) -> Option<usize> {
    let rows = grid.row_count().min(LABEL_SCAN_ROWS);
    for r in 1..=rows {
        for c in 1..=grid.col_count() {
            if labels::classify(&grid.cell(r, c).to_text()) == Some(metric) {
                return Some(r);
            }
        }
    }
    None
}
