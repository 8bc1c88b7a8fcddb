// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::basis::Basis;
use crate::labels::Metric;
use crate::metrics::TimeSpan;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The five extracted totals for one month. Every field is optional:
/// `None` means the sheet carried no value, which is different from zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodValues {
    pub beginning_balance: Option<Decimal>,
    pub ending_balance: Option<Decimal>,
    pub unrealized_gain_loss: Option<Decimal>,
    pub realized_gain_loss: Option<Decimal>,
    pub management_fees: Option<Decimal>,
}

impl PeriodValues {
    pub fn get(&self, metric: Metric) -> Option<Decimal> {
        match metric {
            Metric::BeginningBalance => self.beginning_balance,
            Metric::EndingBalance => self.ending_balance,
            Metric::UnrealizedGainLoss => self.unrealized_gain_loss,
            Metric::RealizedGainLoss => self.realized_gain_loss,
            Metric::ManagementFees => self.management_fees,
        }
    }

    pub fn set(&mut self, metric: Metric, value: Option<Decimal>) {
        let slot = match metric {
            Metric::BeginningBalance => &mut self.beginning_balance,
            Metric::EndingBalance => &mut self.ending_balance,
            Metric::UnrealizedGainLoss => &mut self.unrealized_gain_loss,
            Metric::RealizedGainLoss => &mut self.realized_gain_loss,
            Metric::ManagementFees => &mut self.management_fees,
        };
        *slot = value;
    }

    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

/// One normalized monthly snapshot for a sheet. `as_of_date` is always the
/// last calendar day of the month; the store keeps at most one row per
/// `(sheet, as_of_date)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRecord {
    pub sheet: String,
    pub as_of_date: NaiveDate,
    #[serde(flatten)]
    pub values: PeriodValues,
    pub source: String,
}

/// A computation request: which window policy, and an optional explicit
/// period end (`YYYY`, `YYYY-MM`, `YYYY-MM-DD`) or year.
#[derive(Debug, Clone)]
pub struct OverviewRequest {
    pub basis: Basis,
    pub period_end: Option<String>,
    pub year: Option<i32>,
}

impl Default for OverviewRequest {
    fn default() -> Self {
        Self {
            basis: Basis::Inception,
            period_end: None,
            year: None,
        }
    }
}

/// Derived portfolio performance over a resolved window. Never persisted;
/// callers persist the underlying `PeriodRecord`s instead.
#[derive(Debug, Clone, Serialize)]
pub struct OverviewResult {
    pub sheet: String,
    pub basis: Basis,
    pub period_end: NaiveDate,
    pub initial_value: Decimal,
    pub current_value: Decimal,
    pub moic: Option<f64>,
    pub roi_pct: Option<f64>,
    pub irr_pct: Option<f64>,
    pub time_span: TimeSpan,
    pub source: String,
}

/// Diagnostics from one ingestion run, logged and returned to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct IngestSummary {
    pub sheet: String,
    pub header_row: usize,
    pub date_columns: usize,
    pub mapped_columns: usize,
    pub unmapped_columns: usize,
    pub missing_label: usize,
    pub upserted: Vec<NaiveDate>,
}
