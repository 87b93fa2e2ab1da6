use std::fmt;

/// Non-fatal issues observed while resolving a version.
/// These are carried on the result and reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionWarning {
    /// Tag exists but cannot be parsed as a version for this project
    UnparsableTag { tag: String, reason: String },
    /// Tag target is not reachable from the branch tip
    UnreachableTag { tag: String, branch: String },
    /// Repository is a shallow clone; history-derived values may be truncated
    ShallowHistory { fallback: String },
    /// No commits exist in the repository yet
    EmptyHistory,
    /// A dependency cycle was broken during traversal
    DependencyCycle { project: String },
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionWarning::UnparsableTag { tag, reason } => {
                write!(f, "Cannot parse tag '{}': {}", tag, reason)
            }
            ResolutionWarning::UnreachableTag { tag, branch } => {
                write!(f, "Tag '{}' is not reachable from branch '{}'", tag, branch)
            }
            ResolutionWarning::ShallowHistory { fallback } => {
                write!(
                    f,
                    "Shallow clone detected; using fallback version {}",
                    fallback
                )
            }
            ResolutionWarning::EmptyHistory => {
                write!(f, "Repository has no commits; treating as untagged")
            }
            ResolutionWarning::DependencyCycle { project } => {
                write!(f, "Dependency cycle detected at project '{}'", project)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsable_tag_display() {
        let warning = ResolutionWarning::UnparsableTag {
            tag: "v1.x".to_string(),
            reason: "invalid minor".to_string(),
        };
        assert_eq!(warning.to_string(), "Cannot parse tag 'v1.x': invalid minor");
    }

    #[test]
    fn test_shallow_display_names_fallback() {
        let warning = ResolutionWarning::ShallowHistory {
            fallback: "0.1.0".to_string(),
        };
        assert!(warning.to_string().contains("0.1.0"));
    }

    #[test]
    fn test_all_variants_render() {
        let warnings = vec![
            ResolutionWarning::UnreachableTag {
                tag: "v2.0.0".to_string(),
                branch: "main".to_string(),
            },
            ResolutionWarning::EmptyHistory,
            ResolutionWarning::DependencyCycle {
                project: "core".to_string(),
            },
        ];
        for w in warnings {
            assert!(!w.to_string().is_empty());
        }
    }
}
