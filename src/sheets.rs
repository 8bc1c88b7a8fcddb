// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EngineError, Result};

/// Fold away whitespace and decorative punctuation so "bCAS (Q4 Adj)" and
/// "bcas(q4adj)" compare equal.
pub fn normalize_name(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\u{a0}' | '-' | '_' | '.' | '(' | ')' | '[' | ']' | '{' | '}' | '+'))
        .collect::<String>()
        .to_lowercase()
}

/// Resolve a requested worksheet name against the available names. Exact
/// (raw, then normalized) matches resolve; anything looser only feeds the
/// "did you mean" suggestions on the error.
pub fn resolve<'a>(requested: &str, available: &'a [String]) -> Result<&'a str> {
    if let Some(name) = available.iter().find(|n| n.as_str() == requested.trim()) {
        return Ok(name);
    }
    let want = normalize_name(requested);
    if !want.is_empty() {
        if let Some(name) = available.iter().find(|n| normalize_name(n) == want) {
            return Ok(name);
        }
    }

    let mut suggestions: Vec<String> = available
        .iter()
        .filter(|n| {
            let norm = normalize_name(n);
            !want.is_empty() && (norm.contains(&want) || want.contains(&norm))
        })
        .cloned()
        .collect();
    if suggestions.is_empty() {
        let lower = requested.trim().to_lowercase();
        suggestions = available
            .iter()
            .filter(|n| !lower.is_empty() && n.to_lowercase().starts_with(&lower))
            .cloned()
            .collect();
    }

    Err(EngineError::SheetNotFound {
        requested: requested.to_string(),
        available: available.to_vec(),
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_and_normalized_names_resolve() {
        let avail = names(&["bCAS (Q4 Adj)", "Master"]);
        assert_eq!(resolve("Master", &avail).unwrap(), "Master");
        assert_eq!(resolve("bcas(q4adj)", &avail).unwrap(), "bCAS (Q4 Adj)");
        assert_eq!(resolve(" bCAS (Q4 Adj) ", &avail).unwrap(), "bCAS (Q4 Adj)");
    }

    #[test]
    fn near_misses_error_with_suggestions() {
        let avail = names(&["bCAS (Q4 Adj)", "Master"]);
        match resolve("bcas q4", &avail) {
            Err(EngineError::SheetNotFound { suggestions, available, .. }) => {
                assert!(suggestions.contains(&"bCAS (Q4 Adj)".to_string()));
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unrelated_names_get_no_suggestions() {
        let avail = names(&["Master"]);
        match resolve("Quarterly", &avail) {
            Err(EngineError::SheetNotFound { suggestions, .. }) => {
                assert!(suggestions.is_empty())
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
