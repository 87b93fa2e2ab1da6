use crate::domain::BumpType;
use crate::error::{MonoverError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

/// Glob pattern buckets for changed-file classification.
///
/// Glob syntax: `*` matches within one path segment, `**` crosses segments,
/// `?` matches one character.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilePatterns {
    pub ignore: Vec<String>,
    pub major: Vec<String>,
    pub minor: Vec<String>,
    pub patch: Vec<String>,
    /// Bucket for files matching no pattern. `None` suppresses them.
    pub unmatched: Option<BumpType>,
}

impl FilePatterns {
    /// The bucket unmatched files land in when not configured.
    pub fn unmatched_bump(&self) -> BumpType {
        self.unmatched.unwrap_or(BumpType::Patch)
    }
}

/// What the changed-file set says about a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvidence {
    pub bump: BumpType,
    /// True when files changed but every one matched an ignore pattern.
    pub ignored_only: bool,
    /// The files that contributed evidence, ignore matches excluded.
    pub relevant: Vec<String>,
}

impl FileEvidence {
    pub fn none() -> Self {
        FileEvidence {
            bump: BumpType::None,
            ignored_only: false,
            relevant: Vec::new(),
        }
    }
}

/// Classifies changed files into ignore/major/minor/patch buckets.
pub struct FileChangeClassifier {
    ignore: GlobSet,
    major: GlobSet,
    minor: GlobSet,
    patch: GlobSet,
    unmatched: BumpType,
}

impl FileChangeClassifier {
    pub fn new(patterns: &FilePatterns) -> Result<Self> {
        Ok(FileChangeClassifier {
            ignore: build_set(&patterns.ignore)?,
            major: build_set(&patterns.major)?,
            minor: build_set(&patterns.minor)?,
            patch: build_set(&patterns.patch)?,
            unmatched: patterns.unmatched_bump(),
        })
    }

    /// Classify one path. `None` means the file is excluded outright.
    pub fn classify_file(&self, path: &str) -> Option<BumpType> {
        if self.ignore.is_match(path) {
            return None;
        }
        if self.major.is_match(path) {
            return Some(BumpType::Major);
        }
        if self.minor.is_match(path) {
            return Some(BumpType::Minor);
        }
        if self.patch.is_match(path) {
            return Some(BumpType::Patch);
        }
        Some(self.unmatched)
    }

    /// Classify a changed-file set: the overall bump is the maximum bucket
    /// with at least one match.
    pub fn classify(&self, files: &[String]) -> FileEvidence {
        if files.is_empty() {
            return FileEvidence::none();
        }

        let mut bump = BumpType::None;
        let mut relevant = Vec::new();
        let mut ignored = 0usize;
        for file in files {
            match self.classify_file(file) {
                Some(file_bump) => {
                    debug!(%file, bucket = %file_bump, "classified file");
                    bump = bump.max(file_bump);
                    if file_bump > BumpType::None {
                        relevant.push(file.clone());
                    }
                }
                None => {
                    debug!(%file, "ignored file");
                    ignored += 1;
                }
            }
        }

        FileEvidence {
            bump,
            ignored_only: ignored == files.len(),
            relevant,
        }
    }
}

fn build_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| {
                MonoverError::config(format!("Invalid file pattern '{}': {}", pattern, e))
            })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| MonoverError::config(format!("Cannot compile file patterns: {}", e)))
}
