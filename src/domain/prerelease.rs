//! Prerelease label handling for branch increment policy.
//!
//! Supports the alpha/beta/rc labels plus custom identifiers, and the
//! counter continuation used when rebuilding on the same triple.

use crate::error::{MonoverError, Result};
use std::fmt;
use std::str::FromStr;

/// Prerelease label kind (alpha, beta, rc, or custom).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreReleaseType {
    Alpha,
    Beta,
    ReleaseCandidate,
    Custom(String),
}

impl PreReleaseType {
    /// Parse a label from a string.
    ///
    /// Accepts: "alpha", "a", "beta", "b", "rc", or any alphanumeric-hyphen
    /// custom identifier.
    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// The identifier used in version strings.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl FromStr for PreReleaseType {
    type Err = MonoverError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "alpha" | "a" => Ok(PreReleaseType::Alpha),
            "beta" | "b" => Ok(PreReleaseType::Beta),
            "rc" => Ok(PreReleaseType::ReleaseCandidate),
            other => {
                if !other.is_empty() && other.chars().all(|c| c.is_alphanumeric() || c == '-') {
                    Ok(PreReleaseType::Custom(other.to_string()))
                } else {
                    Err(MonoverError::version(format!(
                        "Invalid prerelease identifier: '{}'",
                        s
                    )))
                }
            }
        }
    }
}

impl fmt::Display for PreReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreReleaseType::Alpha => write!(f, "alpha"),
            PreReleaseType::Beta => write!(f, "beta"),
            PreReleaseType::ReleaseCandidate => write!(f, "rc"),
            PreReleaseType::Custom(s) => write!(f, "{}", s),
        }
    }
}

/// Find the next counter for `label` given the prerelease identifier lists of
/// previously observed versions on the same triple.
///
/// `["rc", "2"]` contributes 2; a bare `["rc"]` contributes 1; anything with
/// a different label contributes nothing. The result is max + 1, or 1 when no
/// prior counter exists.
pub fn next_counter<'a, I>(label: &str, existing: I) -> u64
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut highest = 0u64;
    for idents in existing {
        match idents {
            [first] if first == label => highest = highest.max(1),
            [first, counter, ..] if first == label => {
                if let Ok(n) = counter.parse::<u64>() {
                    highest = highest.max(n);
                }
            }
            _ => {}
        }
    }
    highest + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_labels() {
        assert_eq!(PreReleaseType::parse("alpha").unwrap(), PreReleaseType::Alpha);
        assert_eq!(PreReleaseType::parse("a").unwrap(), PreReleaseType::Alpha);
        assert_eq!(PreReleaseType::parse("beta").unwrap(), PreReleaseType::Beta);
        assert_eq!(PreReleaseType::parse("b").unwrap(), PreReleaseType::Beta);
        assert_eq!(
            PreReleaseType::parse("rc").unwrap(),
            PreReleaseType::ReleaseCandidate
        );
    }

    #[test]
    fn test_parse_custom() {
        assert_eq!(
            PreReleaseType::parse("nightly").unwrap(),
            PreReleaseType::Custom("nightly".to_string())
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(PreReleaseType::parse("not valid!").is_err());
        assert!(PreReleaseType::parse("").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(PreReleaseType::Alpha.to_string(), "alpha");
        assert_eq!(PreReleaseType::ReleaseCandidate.to_string(), "rc");
        assert_eq!(PreReleaseType::Custom("dev".to_string()).to_string(), "dev");
    }

    #[test]
    fn test_next_counter_empty() {
        let existing: Vec<&[String]> = vec![];
        assert_eq!(next_counter("rc", existing), 1);
    }

    #[test]
    fn test_next_counter_continues() {
        let a = vec!["rc".to_string(), "1".to_string()];
        let b = vec!["rc".to_string(), "3".to_string()];
        assert_eq!(next_counter("rc", [a.as_slice(), b.as_slice()]), 4);
    }

    #[test]
    fn test_next_counter_ignores_other_labels() {
        let a = vec!["beta".to_string(), "7".to_string()];
        assert_eq!(next_counter("rc", [a.as_slice()]), 1);
    }

    #[test]
    fn test_next_counter_bare_label_counts_as_one() {
        let a = vec!["alpha".to_string()];
        assert_eq!(next_counter("alpha", [a.as_slice()]), 2);
    }
}
