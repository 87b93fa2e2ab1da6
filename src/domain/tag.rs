use crate::domain::semver::SemVer;
use crate::error::{MonoverError, Result};
use regex::Regex;

/// Whether a tag names the whole repository or a single project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagScope {
    Global,
    Project(String),
}

impl TagScope {
    /// True when a tag of this scope is a version candidate for `project`.
    pub fn applies_to(&self, project: &str) -> bool {
        match self {
            TagScope::Global => true,
            TagScope::Project(p) => p == project,
        }
    }
}

/// A tag name decoded into scope and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTag {
    pub scope: TagScope,
    pub version: SemVer,
}

/// Decodes tag names of the forms `{prefix}{version}` (global) and
/// `{project}-{prefix}{version}` (project-specific).
///
/// Project names may themselves contain hyphens; the longest project prefix
/// wins, e.g. `my-app-v1.2.0` is project `my-app`.
#[derive(Debug, Clone)]
pub struct TagParser {
    pattern: Regex,
}

impl TagParser {
    /// Build a parser for the given tag prefix (commonly "v", may be empty).
    pub fn new(prefix: &str) -> Result<Self> {
        let escaped = regex::escape(prefix);
        let pattern = Regex::new(&format!("^(?:(.+)-)?{}([0-9].*)$", escaped))
            .map_err(|e| MonoverError::tag(format!("Invalid tag prefix '{}': {}", prefix, e)))?;
        Ok(TagParser { pattern })
    }

    /// Decode a tag name. Malformed names are an error for the caller to
    /// downgrade to a warning, never fatal to resolution.
    pub fn parse(&self, name: &str) -> Result<ParsedTag> {
        let captures = self
            .pattern
            .captures(name)
            .ok_or_else(|| MonoverError::tag(format!("Tag '{}' does not match prefix", name)))?;

        let version_part = captures
            .get(2)
            .ok_or_else(|| MonoverError::tag(format!("Tag '{}' has no version part", name)))?;
        let version = SemVer::parse(version_part.as_str())?;

        let scope = match captures.get(1) {
            Some(project) => TagScope::Project(project.as_str().to_string()),
            None => TagScope::Global,
        };

        Ok(ParsedTag { scope, version })
    }
}
