// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::grid::Cell;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};

/// Excel 1900-epoch day zero. Serial 1 is 1899-12-31.
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch")
}

/// Full-date string formats, tried in order.
const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%y", "%d-%b-%Y", "%d-%b-%y"];

/// Datetime variants; the time component is discarded.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Numeric serials outside this open interval are treated as plain numbers
/// (IDs, amounts), not dates.
const SERIAL_MIN: f64 = 20000.0;
const SERIAL_MAX: f64 = 90000.0;

/// Interpret an Excel serial if it falls in the plausible date window.
/// Fractional time-of-day is ignored.
pub fn from_serial(n: f64) -> Option<NaiveDate> {
    if n > SERIAL_MIN && n < SERIAL_MAX {
        excel_epoch().checked_add_signed(Duration::days(n.trunc() as i64))
    } else {
        None
    }
}

/// Whole days since the Excel epoch.
pub fn to_serial(d: NaiveDate) -> i64 {
    (d - excel_epoch()).num_days()
}

/// Best-effort date from a raw cell. Returns `None` rather than erroring:
/// callers treat an unparseable cell as "not a date".
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(n) => from_serial(*n),
        Cell::Text(s) => parse_date_str(s),
        _ => None,
    }
}

fn parse_date_str(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_end_matches('Z');
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    // Month-year tokens ("Jan-24", "Mar 2025"): pin day 1 to parse, then
    // report the month-end since the day is not part of the source value.
    let padded = format!("1-{}", s.replace(' ', "-"));
    for fmt in ["%d-%b-%y", "%d-%b-%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(&padded, fmt) {
            return Some(month_end(d));
        }
    }
    None
}

/// Guards against stray numeric IDs being misread as dates.
pub fn is_sane(d: NaiveDate) -> bool {
    let lo = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid bound");
    let hi = Utc::now().date_naive() + Duration::days(31);
    lo <= d && d <= hi
}

/// A sane date from a raw cell, or `None`.
pub fn parse_sane_date(cell: &Cell) -> Option<NaiveDate> {
    parse_date(cell).filter(|d| is_sane(*d))
}

/// Last calendar day of `d`'s month.
pub fn month_end(d: NaiveDate) -> NaiveDate {
    let (y, m) = (d.year(), d.month());
    let first_next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    first_next.expect("valid month start") - Duration::days(1)
}

/// Month-end of the month before `d`'s month.
pub fn prev_month_end(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).expect("valid month start") - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn serial_round_trip() {
        // Sample the whole admissible window.
        let mut s = 20001;
        while s < 90000 {
            let d = from_serial(s as f64).unwrap();
            assert_eq!(to_serial(d), s, "serial {} did not round-trip", s);
            s += 367;
        }
    }

    #[test]
    fn serial_fraction_is_date_only() {
        assert_eq!(from_serial(45292.75), from_serial(45292.0));
    }

    #[test]
    fn serials_outside_window_are_not_dates() {
        assert_eq!(from_serial(19999.0), None);
        assert_eq!(from_serial(90001.0), None);
        assert_eq!(parse_date(&Cell::Number(1234.0)), None);
    }

    #[test]
    fn string_formats_parse_in_order() {
        assert_eq!(parse_date(&"3/31/2024".into()), Some(ymd(2024, 3, 31)));
        assert_eq!(parse_date(&"2024-03-31".into()), Some(ymd(2024, 3, 31)));
        assert_eq!(parse_date(&"31/03/2024".into()), Some(ymd(2024, 3, 31)));
        assert_eq!(parse_date(&"15-Jan-2023".into()), Some(ymd(2023, 1, 15)));
        assert_eq!(
            parse_date(&"2024-03-31 00:00:00".into()),
            Some(ymd(2024, 3, 31))
        );
    }

    #[test]
    fn month_year_tokens_normalize_to_month_end() {
        assert_eq!(parse_date(&"Jan-24".into()), Some(ymd(2024, 1, 31)));
        assert_eq!(parse_date(&"Feb-24".into()), Some(ymd(2024, 2, 29)));
        assert_eq!(parse_date(&"Mar 2025".into()), Some(ymd(2025, 3, 31)));
    }

    #[test]
    fn sanity_window_rejects_outliers() {
        assert!(!is_sane(ymd(1999, 12, 31)));
        assert!(is_sane(ymd(2015, 6, 30)));
        assert!(!is_sane(Utc::now().date_naive() + Duration::days(90)));
    }

    #[test]
    fn month_end_handles_leap_years() {
        assert_eq!(month_end(ymd(2024, 2, 3)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 2, 3)), ymd(2023, 2, 28));
        assert_eq!(month_end(ymd(2024, 12, 25)), ymd(2024, 12, 31));
        assert_eq!(prev_month_end(ymd(2024, 1, 15)), ymd(2023, 12, 31));
    }
}
