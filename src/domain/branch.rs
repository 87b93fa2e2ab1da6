use std::fmt;

/// Branch classification driving the increment policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Main,
    Dev,
    Release,
    Feature,
}

impl fmt::Display for BranchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchKind::Main => write!(f, "main"),
            BranchKind::Dev => write!(f, "dev"),
            BranchKind::Release => write!(f, "release"),
            BranchKind::Feature => write!(f, "feature"),
        }
    }
}

/// A branch name with its classification and a normalized form safe for use
/// as a prerelease identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchContext {
    pub kind: BranchKind,
    pub name: String,
    pub normalized: String,
}

impl BranchContext {
    /// Classify a branch purely from its name. Unmatched names are Feature.
    pub fn classify(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = match name.as_str() {
            "main" | "master" => BranchKind::Main,
            "dev" | "develop" => BranchKind::Dev,
            _ if name.starts_with("release/") => BranchKind::Release,
            _ => BranchKind::Feature,
        };

        let normalized = normalize(&name);
        BranchContext {
            kind,
            name,
            normalized,
        }
    }

    /// For `release/1.1` style branches, the version text after the prefix.
    pub fn release_target(&self) -> Option<&str> {
        match self.kind {
            BranchKind::Release => self.name.strip_prefix("release/"),
            _ => None,
        }
    }
}

/// Lowercase the name and map every run of non-alphanumeric characters to a
/// single hyphen, so the result is a valid semver prerelease identifier.
fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        out.push_str("branch");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_branches() {
        assert_eq!(BranchContext::classify("main").kind, BranchKind::Main);
        assert_eq!(BranchContext::classify("master").kind, BranchKind::Main);
    }

    #[test]
    fn test_dev_branches() {
        assert_eq!(BranchContext::classify("dev").kind, BranchKind::Dev);
        assert_eq!(BranchContext::classify("develop").kind, BranchKind::Dev);
    }

    #[test]
    fn test_release_branch() {
        let ctx = BranchContext::classify("release/1.1");
        assert_eq!(ctx.kind, BranchKind::Release);
        assert_eq!(ctx.release_target(), Some("1.1"));
    }

    #[test]
    fn test_unmatched_defaults_to_feature() {
        assert_eq!(
            BranchContext::classify("feature/login").kind,
            BranchKind::Feature
        );
        assert_eq!(BranchContext::classify("bugfix-123").kind, BranchKind::Feature);
        assert_eq!(BranchContext::classify("anything").kind, BranchKind::Feature);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(
            BranchContext::classify("feature/OAuth_Login").normalized,
            "feature-oauth-login"
        );
        assert_eq!(BranchContext::classify("fix//double").normalized, "fix-double");
    }

    #[test]
    fn test_normalization_never_empty() {
        assert_eq!(BranchContext::classify("///").normalized, "branch");
    }

    #[test]
    fn test_release_target_only_for_release() {
        assert_eq!(BranchContext::classify("main").release_target(), None);
        assert_eq!(
            BranchContext::classify("feature/x").release_target(),
            None
        );
    }
}
