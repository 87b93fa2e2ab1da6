//! Constraint validation over computed versions.
//!
//! Validation never blocks computation: every check runs, failures
//! accumulate, and the caller decides what a failed result means.

use crate::domain::SemVer;

/// A named wildcard rule the final version must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomRule {
    pub name: String,
    pub pattern: String,
}

/// Version constraints applied after computation.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub minimum_version: Option<SemVer>,
    pub maximum_version: Option<SemVer>,
    /// Wildcard range the version must fall in, e.g. `3.x.x`.
    pub allowed_range: Option<String>,
    pub blocked_versions: Vec<SemVer>,
    /// Require the new version to be strictly greater than the previous tag.
    pub require_monotonic_increase: bool,
    /// Require an explicit approval flag for major bumps.
    pub require_major_approval: bool,
    pub custom_rules: Vec<CustomRule>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.minimum_version.is_none()
            && self.maximum_version.is_none()
            && self.allowed_range.is_none()
            && self.blocked_versions.is_empty()
            && !self.require_monotonic_increase
            && !self.require_major_approval
            && self.custom_rules.is_empty()
    }
}

/// Outcome of running every configured check.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        ValidationResult {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Runs the configured checks against a computed version.
pub struct ConstraintValidator {
    constraints: Constraints,
}

impl ConstraintValidator {
    pub fn new(constraints: Constraints) -> Self {
        ConstraintValidator { constraints }
    }

    /// Validate `version`. `previous` is the base tag's version when one
    /// exists; `major_approved` is the caller's approval flag for major
    /// bumps.
    pub fn validate(
        &self,
        version: &SemVer,
        previous: Option<&SemVer>,
        major_approved: bool,
    ) -> ValidationResult {
        let mut errors = Vec::new();
        let warnings = Vec::new();

        if let Some(ref minimum) = self.constraints.minimum_version {
            if version < minimum {
                errors.push(format!(
                    "version {} is below minimumVersion {}",
                    version, minimum
                ));
            }
        }

        if let Some(ref maximum) = self.constraints.maximum_version {
            if version > maximum {
                errors.push(format!(
                    "version {} is above maximumVersion {}",
                    version, maximum
                ));
            }
        }

        if let Some(ref range) = self.constraints.allowed_range {
            match range_matches(range, version) {
                Ok(true) => {}
                Ok(false) => errors.push(format!(
                    "version {} is outside allowedRange {}",
                    version, range
                )),
                Err(reason) => errors.push(format!(
                    "allowedRange '{}' is not a valid pattern: {}",
                    range, reason
                )),
            }
        }

        if self.constraints.blocked_versions.iter().any(|b| b == version) {
            errors.push(format!("version {} is in blockedVersions", version));
        }

        if self.constraints.require_monotonic_increase {
            if let Some(previous) = previous {
                if version <= previous {
                    errors.push(format!(
                        "version {} does not increase over previous {} (requireMonotonicIncrease)",
                        version, previous
                    ));
                }
            }
        }

        if self.constraints.require_major_approval && !major_approved {
            if let Some(previous) = previous {
                if version.major > previous.major {
                    errors.push(format!(
                        "major bump to {} requires approval (requireMajorApproval)",
                        version
                    ));
                }
            }
        }

        for rule in &self.constraints.custom_rules {
            match range_matches(&rule.pattern, version) {
                Ok(true) => {}
                Ok(false) => errors.push(format!(
                    "version {} violates rule '{}' ({})",
                    version, rule.name, rule.pattern
                )),
                Err(reason) => errors.push(format!(
                    "rule '{}' has invalid pattern '{}': {}",
                    rule.name, rule.pattern, reason
                )),
            }
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

/// Match the numeric triple against a wildcard range via the semver crate.
/// Prerelease identifiers do not exempt a version from its range.
fn range_matches(pattern: &str, version: &SemVer) -> Result<bool, String> {
    let req = semver::VersionReq::parse(pattern).map_err(|e| e.to_string())?;
    let triple = semver::Version::new(version.major, version.minor, version.patch);
    Ok(req.matches(&triple))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> SemVer {
        SemVer::parse(s).unwrap()
    }

    #[test]
    fn test_no_constraints_is_valid() {
        let validator = ConstraintValidator::new(Constraints::default());
        let result = validator.validate(&v("1.2.3"), None, false);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn test_minimum_violation_names_constraint() {
        let validator = ConstraintValidator::new(Constraints {
            minimum_version: Some(v("2.0.0")),
            ..Constraints::default()
        });
        let result = validator.validate(&v("1.9.0"), None, false);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("minimumVersion"));
    }

    #[test]
    fn test_maximum_violation() {
        let validator = ConstraintValidator::new(Constraints {
            maximum_version: Some(v("3.0.0")),
            ..Constraints::default()
        });
        assert!(!validator.validate(&v("3.0.1"), None, false).is_valid);
        assert!(validator.validate(&v("3.0.0"), None, false).is_valid);
    }

    #[test]
    fn test_allowed_range_wildcard() {
        let validator = ConstraintValidator::new(Constraints {
            allowed_range: Some("3.x.x".to_string()),
            ..Constraints::default()
        });
        assert!(validator.validate(&v("3.4.5"), None, false).is_valid);
        assert!(!validator.validate(&v("4.0.0"), None, false).is_valid);
    }

    #[test]
    fn test_invalid_range_reported_not_fatal() {
        let validator = ConstraintValidator::new(Constraints {
            allowed_range: Some("not a range".to_string()),
            ..Constraints::default()
        });
        let result = validator.validate(&v("1.0.0"), None, false);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("not a valid pattern"));
    }

    #[test]
    fn test_blocked_versions() {
        let validator = ConstraintValidator::new(Constraints {
            blocked_versions: vec![v("1.3.0")],
            ..Constraints::default()
        });
        assert!(!validator.validate(&v("1.3.0"), None, false).is_valid);
        assert!(validator.validate(&v("1.3.1"), None, false).is_valid);
    }

    #[test]
    fn test_monotonic_increase() {
        let validator = ConstraintValidator::new(Constraints {
            require_monotonic_increase: true,
            ..Constraints::default()
        });
        assert!(!validator
            .validate(&v("1.0.0"), Some(&v("1.0.0")), false)
            .is_valid);
        assert!(validator
            .validate(&v("1.0.1"), Some(&v("1.0.0")), false)
            .is_valid);
        // no previous tag - nothing to compare against
        assert!(validator.validate(&v("0.1.0"), None, false).is_valid);
    }

    #[test]
    fn test_major_approval() {
        let validator = ConstraintValidator::new(Constraints {
            require_major_approval: true,
            ..Constraints::default()
        });
        let previous = v("1.4.0");
        assert!(!validator
            .validate(&v("2.0.0"), Some(&previous), false)
            .is_valid);
        assert!(validator
            .validate(&v("2.0.0"), Some(&previous), true)
            .is_valid);
        assert!(validator
            .validate(&v("1.5.0"), Some(&previous), false)
            .is_valid);
    }

    #[test]
    fn test_all_checks_run_after_failure() {
        let validator = ConstraintValidator::new(Constraints {
            minimum_version: Some(v("2.0.0")),
            blocked_versions: vec![v("1.0.0")],
            ..Constraints::default()
        });
        let result = validator.validate(&v("1.0.0"), None, false);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_custom_rules() {
        let validator = ConstraintValidator::new(Constraints {
            custom_rules: vec![CustomRule {
                name: "lts-line".to_string(),
                pattern: "2.x.x".to_string(),
            }],
            ..Constraints::default()
        });
        assert!(validator.validate(&v("2.1.0"), None, false).is_valid);
        let result = validator.validate(&v("3.0.0"), None, false);
        assert!(!result.is_valid);
        assert!(result.errors[0].contains("lts-line"));
    }
}
