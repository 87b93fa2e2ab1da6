//! Change-evidence classification from commit messages and file paths.

pub mod commits;
pub mod files;

pub use commits::{CommitClassifier, CommitPatterns, CommitVerdict};
pub use files::{FileChangeClassifier, FileEvidence, FilePatterns};

use crate::domain::BumpType;

/// Combined change evidence for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvidence {
    pub from_commits: BumpType,
    pub from_files: BumpType,
    /// Every changed file matched an ignore pattern.
    pub ignored_only: bool,
    pub changed_files: Vec<String>,
    /// The dependency whose change propagated here, when the project's own
    /// files were untouched.
    pub matched_dependency: Option<String>,
}

impl ChangeEvidence {
    /// The merged verdict: the highest signal wins.
    pub fn bump(&self) -> BumpType {
        self.from_commits.max(self.from_files)
    }

    /// Whether any signal justifies producing a new version.
    pub fn is_changed(&self) -> bool {
        self.bump() > BumpType::None || self.matched_dependency.is_some()
    }
}
