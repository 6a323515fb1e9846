//! Text extraction primitives shared by version detection and replacement.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::hash::Hash;

/// Extract all matches from content using a regex pattern with one capture group.
/// Falls back to the whole match when the pattern has no capture group.
/// Returns None only on regex compile error.
pub fn extract_all(content: &str, pattern: &str) -> Option<Vec<String>> {
    let re = Regex::new(pattern).ok()?;
    let matches: Vec<String> = re
        .captures_iter(content)
        .filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(0))
                .map(|m| m.as_str().to_string())
        })
        .collect();
    Some(matches)
}

/// Validate all extracted values are identical, return the canonical value.
/// Used for version consistency checks across multiple manifest occurrences.
pub fn require_identical<T>(values: &[T], context: &str) -> Result<T>
where
    T: Clone + Eq + Hash + std::fmt::Display + Ord,
{
    if values.is_empty() {
        return Err(Error::internal_unexpected(format!(
            "No values found in {}",
            context
        )));
    }

    let unique: BTreeSet<&T> = values.iter().collect();
    if unique.len() != 1 {
        let items: Vec<String> = unique.iter().map(|v| v.to_string()).collect();
        return Err(Error::version_mismatch(items, context.to_string()));
    }

    Ok(values[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_all_collects_capture_groups() {
        let content = "version: 1.2.3\nother: x\nversion: 1.2.3\n";
        let values = extract_all(content, r"version: ([0-9.]+)").unwrap();
        assert_eq!(values, vec!["1.2.3", "1.2.3"]);
    }

    #[test]
    fn extract_all_rejects_invalid_pattern() {
        assert!(extract_all("content", "[unclosed").is_none());
    }

    #[test]
    fn require_identical_returns_single_value() {
        let values = vec!["1.0.0".to_string(), "1.0.0".to_string()];
        assert_eq!(require_identical(&values, "pom.xml").unwrap(), "1.0.0");
    }

    #[test]
    fn require_identical_fails_on_disagreement() {
        let values = vec!["1.0.0".to_string(), "1.0.1".to_string()];
        let err = require_identical(&values, "pom.xml").unwrap_err();
        assert_eq!(err.code.as_str(), "version.mismatch");
        assert!(err.message.contains("1.0.1"));
    }

    #[test]
    fn require_identical_fails_on_empty() {
        let values: Vec<String> = Vec::new();
        assert!(require_identical(&values, "pom.xml").is_err());
    }
}
