// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EngineError, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Time-window policy used to pick which two period values to compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    Inception,
    Ytd,
    Quarter,
    Month,
    Day,
    Latest,
}

impl Basis {
    /// `Latest` is month basis applied to the most recent available date.
    pub fn effective(self) -> Basis {
        match self {
            Basis::Latest => Basis::Month,
            b => b,
        }
    }

    /// Single-point windows resolve their initial value from the prior
    /// period rather than a window start.
    pub fn is_single_point(self) -> bool {
        matches!(self.effective(), Basis::Month | Basis::Day)
    }
}

impl FromStr for Basis {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "inception" => Ok(Basis::Inception),
            "ytd" => Ok(Basis::Ytd),
            "quarter" => Ok(Basis::Quarter),
            "month" => Ok(Basis::Month),
            "day" => Ok(Basis::Day),
            "latest" => Ok(Basis::Latest),
            other => Err(EngineError::InvalidPeriodSpec(format!(
                "unknown basis '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Basis::Inception => "inception",
            Basis::Ytd => "ytd",
            Basis::Quarter => "quarter",
            Basis::Month => "month",
            Basis::Day => "day",
            Basis::Latest => "latest",
        };
        f.write_str(s)
    }
}

fn quarter_start(d: NaiveDate) -> NaiveDate {
    let q_month = ((d.month() - 1) / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(d.year(), q_month, 1).expect("valid quarter start")
}

fn ytd_start(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), 1, 1).expect("valid year start")
}

/// Resolve the requested period end against the available dates.
/// Priority: explicit year, then the period-end string (`YYYY`, `YYYY-MM`,
/// or a full ISO date), then the latest available date.
fn coerce_period_end(
    dates: &[NaiveDate],
    period_end: Option<&str>,
    year: Option<i32>,
) -> Result<NaiveDate> {
    let latest = *dates.last().expect("non-empty dates");

    if let Some(y) = year {
        return dates
            .iter()
            .rev()
            .find(|d| d.year() == y)
            .copied()
            .ok_or_else(|| EngineError::InvalidPeriodSpec(format!("year {}", y)));
    }

    let Some(raw) = period_end else {
        return Ok(latest);
    };
    let s = raw.trim();
    if s.is_empty() {
        return Ok(latest);
    }

    let invalid = || EngineError::InvalidPeriodSpec(s.to_string());

    if s.len() == 7 && s.is_ascii() && s.as_bytes()[4] == b'-' {
        let y: i32 = s[..4].parse().map_err(|_| invalid())?;
        let m: u32 = s[5..7].parse().map_err(|_| invalid())?;
        return dates
            .iter()
            .rev()
            .find(|d| d.year() == y && d.month() == m)
            .copied()
            .ok_or_else(invalid);
    }
    if s.len() == 4 && s.chars().all(|c| c.is_ascii_digit()) {
        let y: i32 = s.parse().map_err(|_| invalid())?;
        return dates
            .iter()
            .rev()
            .find(|d| d.year() == y)
            .copied()
            .ok_or_else(invalid);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| invalid())
}

/// Compute the `(start, end)` bounds for a basis over the sorted set of
/// available period dates. `end` never exceeds the latest known date.
pub fn resolve_window(
    dates: &[NaiveDate],
    basis: Basis,
    period_end: Option<&str>,
    year: Option<i32>,
) -> Result<(NaiveDate, NaiveDate)> {
    if dates.is_empty() {
        return Err(EngineError::InvalidPeriodSpec(
            "no period dates available".to_string(),
        ));
    }
    let earliest = dates[0];
    let latest = *dates.last().expect("non-empty dates");

    let mut end = coerce_period_end(dates, period_end, year)?;
    if end > latest {
        end = latest;
    }

    let start = match basis.effective() {
        Basis::Inception => earliest,
        Basis::Ytd => ytd_start(end),
        Basis::Quarter => quarter_start(end),
        Basis::Month | Basis::Day | Basis::Latest => end,
    };
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month_ends() -> Vec<NaiveDate> {
        vec![
            ymd(2024, 1, 31),
            ymd(2024, 2, 29),
            ymd(2024, 3, 31),
            ymd(2024, 4, 30),
            ymd(2024, 5, 31),
            ymd(2024, 6, 30),
        ]
    }

    #[test]
    fn basis_parses_lowercase_names() {
        assert_eq!("ytd".parse::<Basis>().unwrap(), Basis::Ytd);
        assert_eq!(" Inception ".parse::<Basis>().unwrap(), Basis::Inception);
        assert!("weekly".parse::<Basis>().is_err());
    }

    #[test]
    fn inception_spans_all_dates() {
        let (s, e) = resolve_window(&month_ends(), Basis::Inception, None, None).unwrap();
        assert_eq!(s, ymd(2024, 1, 31));
        assert_eq!(e, ymd(2024, 6, 30));
    }

    #[test]
    fn ytd_starts_january_first() {
        let (s, e) =
            resolve_window(&month_ends(), Basis::Ytd, Some("2024-06-15"), None).unwrap();
        assert_eq!(s, ymd(2024, 1, 1));
        assert_eq!(e, ymd(2024, 6, 15));
    }

    #[test]
    fn quarter_starts_on_quarter_boundary() {
        let (s, e) = resolve_window(&month_ends(), Basis::Quarter, Some("2024-05"), None).unwrap();
        assert_eq!(s, ymd(2024, 4, 1));
        assert_eq!(e, ymd(2024, 5, 31));
    }

    #[test]
    fn month_basis_is_a_point_window() {
        let (s, e) = resolve_window(&month_ends(), Basis::Month, Some("2024-03"), None).unwrap();
        assert_eq!(s, e);
        assert_eq!(e, ymd(2024, 3, 31));
    }

    #[test]
    fn latest_behaves_like_month_of_last_date() {
        let (s, e) = resolve_window(&month_ends(), Basis::Latest, None, None).unwrap();
        assert_eq!(s, ymd(2024, 6, 30));
        assert_eq!(e, ymd(2024, 6, 30));
    }

    #[test]
    fn explicit_year_picks_latest_in_year() {
        let mut dates = month_ends();
        dates.push(ymd(2025, 1, 31));
        let (_, e) = resolve_window(&dates, Basis::Inception, None, Some(2024)).unwrap();
        assert_eq!(e, ymd(2024, 6, 30));
    }

    #[test]
    fn end_clamps_to_latest_available() {
        let (_, e) =
            resolve_window(&month_ends(), Basis::Inception, Some("2030-12-31"), None).unwrap();
        assert_eq!(e, ymd(2024, 6, 30));
    }

    #[test]
    fn unmatched_specs_error() {
        assert!(resolve_window(&month_ends(), Basis::Month, Some("2019-01"), None).is_err());
        assert!(resolve_window(&month_ends(), Basis::Month, Some("banana"), None).is_err());
        assert!(resolve_window(&month_ends(), Basis::Month, None, Some(1999)).is_err());
        assert!(resolve_window(&[], Basis::Inception, None, None).is_err());
    }
}
