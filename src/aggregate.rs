// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::grid::{Cell, Grid};
use crate::labels;
use rust_decimal::Decimal;

/// Subtotal rows already covered by summing the individual entries beneath a
/// label; including them would double-count.
const FORBIDDEN_ROW_NAMES: &[&str] = &["total", "grand total", "entity level"];

/// Column holding the investor/entity name in the blocks we aggregate.
const NAME_COL: usize = 2;
/// Column holding a row identifier when the name cell is blank.
const ID_COL: usize = 1;

/// A block ends after this many consecutive rows with neither name nor id.
const MAX_BLANK_STREAK: usize = 50;

/// Parse a cell as a financial amount. Thousands separators and currency
/// symbols are stripped, `(123.45)` reads as negative, and the dash family
/// (`-`, `—`, `–`) is "no value" — never zero.
pub fn parse_amount(cell: &Cell) -> Option<Decimal> {
    match cell {
        Cell::Number(n) => Decimal::from_f64_retain(*n),
        Cell::Text(raw) => {
            let mut s = raw.trim().to_string();
            if s.is_empty() || matches!(s.as_str(), "—" | "-" | "–") {
                return None;
            }
            s = s.replace([',', '$'], "");
            let negative = s.starts_with('(') && s.ends_with(')');
            if negative {
                s = s[1..s.len() - 1].to_string();
            }
            let parsed: Decimal = s.trim().parse().ok()?;
            Some(if negative { -parsed } else { parsed })
        }
        _ => None,
    }
}

/// Sum the investor rows beneath `label_row` at `column`, stopping before
/// `stop_row` (the next metric's label row) or the end of the grid. Subtotal
/// rows are skipped; a long run of blank rows ends the block. Returns `None`
/// when nothing numeric was found, so callers can tell "no data" from a sum
/// that happens to be zero.
pub fn sum_rows(
    grid: &Grid,
    label_row: usize,
    column: usize,
    stop_row: Option<usize>,
) -> Option<Decimal> {
    let rows = grid.row_count();
    let limit = stop_row.unwrap_or(rows + 1);
    let mut total = Decimal::ZERO;
    let mut have_value = false;
    let mut blanks = 0usize;

    let mut r = label_row + 1;
    while r < limit && r <= rows {
        let id_txt = labels::normalize(&grid.cell(r, ID_COL).to_text());
        let name_txt = labels::normalize(&grid.cell(r, NAME_COL).to_text());
        if FORBIDDEN_ROW_NAMES.contains(&name_txt.as_str())
            || FORBIDDEN_ROW_NAMES.contains(&id_txt.as_str())
        {
            blanks = 0;
            r += 1;
            continue;
        }
        let is_data_row = !name_txt.is_empty() || !id_txt.is_empty();
        if !is_data_row {
            blanks += 1;
            if blanks >= MAX_BLANK_STREAK {
                break;
            }
            r += 1;
            continue;
        }
        blanks = 0;
        if let Some(v) = parse_amount(grid.cell(r, column)) {
            total += v;
            have_value = true;
        }
        r += 1;
    }
    have_value.then_some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn amounts_strip_separators_and_symbols() {
        assert_eq!(parse_amount(&"1,234.50".into()), Some(dec("1234.50")));
        assert_eq!(parse_amount(&"$2,000".into()), Some(dec("2000")));
        assert_eq!(parse_amount(&Cell::Number(10.5)), Some(dec("10.5")));
    }

    #[test]
    fn parenthesized_amounts_are_negative() {
        assert_eq!(parse_amount(&"(123.45)".into()), Some(dec("-123.45")));
        assert_eq!(parse_amount(&"($1,000)".into()), Some(dec("-1000")));
    }

    #[test]
    fn dashes_and_junk_are_no_value() {
        assert_eq!(parse_amount(&"—".into()), None);
        assert_eq!(parse_amount(&"-".into()), None);
        assert_eq!(parse_amount(&"–".into()), None);
        assert_eq!(parse_amount(&Cell::Empty), None);
        assert_eq!(parse_amount(&"n/a".into()), None);
    }

    #[test]
    fn sums_skip_subtotal_rows() {
        let g = Grid::new(vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "100".into()],
            vec!["2".into(), "Fund B".into(), "250".into()],
            vec!["".into(), "Total".into(), "350".into()],
            vec!["".into(), "Entity Level".into(), "350".into()],
        ]);
        assert_eq!(sum_rows(&g, 1, 3, None), Some(dec("350")));
    }

    #[test]
    fn stop_row_bounds_the_block() {
        let g = Grid::new(vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "100".into()],
            vec!["Management Fees".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "7".into()],
        ]);
        assert_eq!(sum_rows(&g, 1, 3, Some(3)), Some(dec("100")));
        assert_eq!(sum_rows(&g, 3, 3, None), Some(dec("7")));
    }

    #[test]
    fn long_blank_run_terminates_the_block() {
        let mut rows: Vec<Vec<Cell>> = vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "100".into()],
        ];
        rows.extend(std::iter::repeat_with(Vec::new).take(60));
        rows.push(vec!["9".into(), "Straggler".into(), "900".into()]);
        let g = Grid::new(rows);
        assert_eq!(sum_rows(&g, 1, 3, None), Some(dec("100")));
    }

    #[test]
    fn short_gaps_do_not_terminate() {
        let mut rows: Vec<Vec<Cell>> = vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "100".into()],
        ];
        rows.extend(std::iter::repeat_with(Vec::new).take(3));
        rows.push(vec!["2".into(), "Fund B".into(), "50".into()]);
        let g = Grid::new(rows);
        assert_eq!(sum_rows(&g, 1, 3, None), Some(dec("150")));
    }

    #[test]
    fn none_when_no_numeric_cells() {
        let g = Grid::new(vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "—".into()],
            vec!["2".into(), "Fund B".into(), "".into()],
        ]);
        assert_eq!(sum_rows(&g, 1, 3, None), None);
    }

    #[test]
    fn non_numeric_cells_do_not_fail_the_row() {
        let g = Grid::new(vec![
            vec!["Ending Balance".into(), "".into(), "".into()],
            vec!["1".into(), "Fund A".into(), "see note".into()],
            vec!["2".into(), "Fund B".into(), "(25)".into()],
        ]);
        assert_eq!(sum_rows(&g, 1, 3, None), Some(dec("-25")));
    }
}
