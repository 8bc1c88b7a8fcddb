// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::fmt;

/// The five canonical financial line items the engine extracts. Everything
/// else in a sheet is noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Metric {
    BeginningBalance,
    EndingBalance,
    UnrealizedGainLoss,
    RealizedGainLoss,
    ManagementFees,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::BeginningBalance,
        Metric::EndingBalance,
        Metric::UnrealizedGainLoss,
        Metric::RealizedGainLoss,
        Metric::ManagementFees,
    ];

    /// Column name in the period store.
    pub fn column(&self) -> &'static str {
        match self {
            Metric::BeginningBalance => "beginning_balance",
            Metric::EndingBalance => "ending_balance",
            Metric::UnrealizedGainLoss => "unrealized_gain_loss",
            Metric::RealizedGainLoss => "realized_gain_loss",
            Metric::ManagementFees => "management_fees",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Metric::BeginningBalance => "Beginning Balance",
            Metric::EndingBalance => "Ending Balance",
            Metric::UnrealizedGainLoss => "Unrealized Gain/Loss",
            Metric::RealizedGainLoss => "Realized Gain/Loss",
            Metric::ManagementFees => "Management Fees",
        };
        f.write_str(s)
    }
}

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(&format!("^(?:{})$", p)).expect("valid alias pattern"))
        .collect()
}

/// Alias pattern sets, matched against normalized caption text as a full
/// string. Sets are mutually exclusive by construction; a caption that could
/// match two metrics is a data-quality problem, not something to resolve here.
static ALIASES: Lazy<Vec<(Metric, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            Metric::BeginningBalance,
            compile(&[
                r"begin(?:ning)? balance",
                r"opening (?:nav|balance)",
                r"current period begin(?:ning)? balance",
                r"total begin(?:ning)? balance",
            ]),
        ),
        (
            Metric::EndingBalance,
            compile(&[
                r"ending balance",
                r"closing balance",
                r"current value",
                r"total ending balance",
                r"total current value",
            ]),
        ),
        (
            Metric::UnrealizedGainLoss,
            compile(&[
                r"unrealis?ed gain/?loss",
                r"unrealized pnl",
                r"unrealis?ed gain/\(loss\)",
                r"total unrealis?ed gain/?loss",
            ]),
        ),
        (
            Metric::RealizedGainLoss,
            compile(&[
                r"realis?ed gain/?loss",
                r"realized pnl",
                r"realis?ed gain/\(loss\)",
                r"total realis?ed gain/?loss",
            ]),
        ),
        (
            Metric::ManagementFees,
            compile(&[
                r"management fees?",
                r"mgmt fees?",
                r"total management fees?",
            ]),
        ),
    ]
});

/// Fold exotic whitespace/dashes, collapse runs, lowercase.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .chars()
        .map(|c| match c {
            '\u{a0}' => ' ',
            '\u{2011}' => '-',
            c => c,
        })
        .collect();
    folded
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Classify a caption against the canonical metrics. Full-string match only,
/// so longer captions that merely contain an alias do not false-positive.
pub fn classify(text: &str) -> Option<Metric> {
    let norm = normalize(text);
    if norm.is_empty() {
        return None;
    }
    for (metric, patterns) in ALIASES.iter() {
        if patterns.iter().any(|p| p.is_match(&norm)) {
            return Some(*metric);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_captions_classify() {
        assert_eq!(classify("Ending Balance"), Some(Metric::EndingBalance));
        assert_eq!(classify("  CLOSING\u{a0}BALANCE "), Some(Metric::EndingBalance));
        assert_eq!(classify("Current Value"), Some(Metric::EndingBalance));
        assert_eq!(classify("Beginning Balance"), Some(Metric::BeginningBalance));
        assert_eq!(classify("Opening NAV"), Some(Metric::BeginningBalance));
        assert_eq!(
            classify("Current Period Beg Balance"),
            Some(Metric::BeginningBalance)
        );
        assert_eq!(
            classify("Unrealised Gain/Loss"),
            Some(Metric::UnrealizedGainLoss)
        );
        assert_eq!(classify("Realized PnL"), Some(Metric::RealizedGainLoss));
        assert_eq!(classify("Mgmt Fee"), Some(Metric::ManagementFees));
        assert_eq!(classify("Total Management Fees"), Some(Metric::ManagementFees));
    }

    #[test]
    fn substrings_do_not_match() {
        assert_eq!(classify("Projected Ending Balance FY25"), None);
        assert_eq!(classify("Ending"), None);
        assert_eq!(classify(""), None);
        assert_eq!(classify("Investor"), None);
    }

    #[test]
    fn realized_and_unrealized_stay_distinct() {
        assert_eq!(
            classify("Unrealized Gain/Loss"),
            Some(Metric::UnrealizedGainLoss)
        );
        assert_eq!(classify("Realized Gain/Loss"), Some(Metric::RealizedGainLoss));
        assert_eq!(
            classify("Realised Gain/(Loss)"),
            Some(Metric::RealizedGainLoss)
        );
    }
}
