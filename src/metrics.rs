// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;

/// Elapsed window between the two compared period values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSpan {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: i64,
    pub years: f64,
}

impl TimeSpan {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let days = (end - start).num_days();
        Self {
            start_date: start,
            end_date: end,
            days,
            years: days as f64 / 365.25,
        }
    }
}

/// The three derived ratios. Independently nullable: a missing guard on one
/// does not block the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub moic: Option<f64>,
    pub roi_pct: Option<f64>,
    pub irr_pct: Option<f64>,
}

/// MOIC, ROI% and annualized IRR% from two snapshots. IRR here is the
/// two-point annualized growth rate (CAGR): only beginning/ending snapshots
/// exist, so intermediate cash-flow dates cannot be factored in.
pub fn compute(initial: Decimal, current: Decimal, start: NaiveDate, end: NaiveDate) -> Kpis {
    let initial_f = initial.to_f64().unwrap_or(f64::NAN);
    let current_f = current.to_f64().unwrap_or(f64::NAN);
    if initial.is_zero() || !initial_f.is_finite() || !current_f.is_finite() {
        return Kpis::default();
    }

    let moic = current_f / initial_f;
    let roi_pct = (current_f - initial_f) / initial_f * 100.0;

    let years = TimeSpan::new(start, end).years;
    let irr_pct = if initial_f > 0.0 && years > 0.0 {
        Some((moic.powf(1.0 / years) - 1.0) * 100.0)
    } else {
        None
    };

    Kpis {
        moic: Some(moic),
        roi_pct: Some(roi_pct),
        irr_pct,
    }
}
