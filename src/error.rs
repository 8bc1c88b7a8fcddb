// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::labels::Metric;
use thiserror::Error;

/// Structural failures surfaced to the caller. Cell-level problems (a bad
/// date, an unparseable amount) are absorbed as `None` long before this layer.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("worksheet '{requested}' not found; available: {available:?}; did you mean: {suggestions:?}")]
    SheetNotFound {
        requested: String,
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    #[error("no header row with at least two date cells found in the first {rows_scanned} rows")]
    NoHeaderDetected { rows_scanned: usize },

    #[error("header located but no usable date axis (per-column dates or control date) in the first {rows_scanned} rows")]
    NoDateColumnFound { rows_scanned: usize },

    #[error("required metric column '{metric}' not found near the header row")]
    NoMetricColumnFound { metric: Metric },

    #[error("no parsable numeric rows found for sheet '{sheet}'")]
    NoNumericRows { sheet: String },

    #[error("invalid period spec '{0}' (expected YYYY, YYYY-MM or YYYY-MM-DD matching an available period)")]
    InvalidPeriodSpec(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
