use crate::domain::BumpType;
use crate::git::CommitInfo;
use regex::Regex;
use tracing::debug;

/// Header prefix lists driving commit classification.
///
/// A pattern matches when a line of the message starts with it
/// (case-insensitive); the special `!:` pattern matches a breaking-change
/// marker in the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPatterns {
    pub major: Vec<String>,
    pub minor: Vec<String>,
    pub patch: Vec<String>,
    pub ignore: Vec<String>,
}

impl Default for CommitPatterns {
    fn default() -> Self {
        CommitPatterns {
            major: vec!["BREAKING CHANGE:".to_string(), "!:".to_string()],
            minor: vec!["feat:".to_string(), "feature:".to_string()],
            patch: vec![
                "fix:".to_string(),
                "bugfix:".to_string(),
                "perf:".to_string(),
                "refactor:".to_string(),
            ],
            ignore: vec![
                "chore:".to_string(),
                "docs:".to_string(),
                "style:".to_string(),
                "test:".to_string(),
                "ci:".to_string(),
            ],
        }
    }
}

/// Per-commit classification outcome, kept for changelog rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitVerdict {
    pub id: String,
    pub summary: String,
    pub bump: BumpType,
}

/// Classifies conventional-commit messages into bump verdicts.
pub struct CommitClassifier {
    patterns: CommitPatterns,
    breaking_header: Regex,
    header: Regex,
}

impl CommitClassifier {
    pub fn new(patterns: CommitPatterns) -> Self {
        // type(scope)!: or type!: at the start of the header
        let breaking_header =
            Regex::new(r"^[a-zA-Z]+(\([^)]*\))?!:").expect("breaking header pattern");
        // type with optional scope and bang, used to normalize the header
        let header = Regex::new(r"^([a-zA-Z]+)(\([^)]*\))?!?:").expect("header pattern");
        CommitClassifier {
            patterns,
            breaking_header,
            header,
        }
    }

    /// Classify one message.
    ///
    /// A breaking marker (`!` before the header colon, or a
    /// `BREAKING CHANGE:` body line) always yields Major regardless of the
    /// type prefix. Ignore-listed types yield None. Non-conventional
    /// messages default to Patch.
    pub fn classify_message(&self, message: &str) -> BumpType {
        if self.is_breaking(message) {
            return BumpType::Major;
        }
        if self.matches_any(message, &self.patterns.ignore) {
            return BumpType::None;
        }
        if self.matches_any(message, &self.patterns.major) {
            return BumpType::Major;
        }
        if self.matches_any(message, &self.patterns.minor) {
            return BumpType::Minor;
        }
        if self.matches_any(message, &self.patterns.patch) {
            return BumpType::Patch;
        }
        BumpType::Patch
    }

    /// Classify a commit range, aggregating by maximum bump.
    pub fn classify(&self, commits: &[CommitInfo]) -> (BumpType, Vec<CommitVerdict>) {
        let mut overall = BumpType::None;
        let mut verdicts = Vec::with_capacity(commits.len());

        for commit in commits {
            let bump = self.classify_message(&commit.message);
            debug!(commit = %commit.id, %bump, "classified commit");
            overall = overall.max(bump);
            verdicts.push(CommitVerdict {
                id: commit.id.clone(),
                summary: commit.summary().to_string(),
                bump,
            });
        }

        (overall, verdicts)
    }

    fn is_breaking(&self, message: &str) -> bool {
        let header = message.lines().next().unwrap_or("");
        if self.breaking_header.is_match(header) {
            return true;
        }
        message
            .lines()
            .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"))
    }

    fn matches_any(&self, message: &str, patterns: &[String]) -> bool {
        let header = message.lines().next().unwrap_or("");
        // "feat(auth): x" matches the "feat:" pattern via the scope-stripped form
        let canonical = self
            .header
            .captures(header)
            .map(|c| format!("{}:", &c[1]));
        patterns.iter().any(|p| {
            if p == "!:" {
                self.breaking_header.is_match(header)
            } else if p.ends_with(':') && !p.contains(' ') {
                // type prefixes bind to the header only
                starts_with_ignore_case(header, p)
                    || canonical
                        .as_deref()
                        .is_some_and(|c| c.eq_ignore_ascii_case(p))
            } else {
                message.lines().any(|line| starts_with_ignore_case(line, p))
            }
        })
    }
}

impl Default for CommitClassifier {
    fn default() -> Self {
        Self::new(CommitPatterns::default())
    }
}

fn starts_with_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .get(..needle.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(needle))
}
