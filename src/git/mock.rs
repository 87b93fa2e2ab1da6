use crate::error::{MonoverError, Result};
use crate::git::{CommitInfo, GitHistory, TagRef};
use git2::Oid;
use std::collections::HashMap;

/// In-memory history for tests: a single linear chain of commits with
/// branch heads pointing at positions along it.
///
/// Commits are appended with [MockHistory::commit], which also advances the
/// head of the checked-out branch; [MockHistory::checkout] forks a new
/// branch at the current position. Ancestry follows chain order.
pub struct MockHistory {
    chain: Vec<Oid>,
    commits: HashMap<Oid, CommitInfo>,
    files: HashMap<Oid, Vec<String>>,
    tags: Vec<TagRef>,
    branch_heads: HashMap<String, Oid>,
    current: String,
    shallow: bool,
}

impl MockHistory {
    pub fn new() -> Self {
        MockHistory {
            chain: Vec::new(),
            commits: HashMap::new(),
            files: HashMap::new(),
            tags: Vec::new(),
            branch_heads: HashMap::new(),
            current: "main".to_string(),
            shallow: false,
        }
    }

    /// Append a commit touching `files` and advance the current branch.
    pub fn commit(&mut self, message: impl Into<String>, files: &[&str]) -> Oid {
        let n = self.chain.len() as u64 + 1;
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        let oid = Oid::from_bytes(&bytes).expect("valid oid");
        self.chain.push(oid);
        self.commits.insert(
            oid,
            CommitInfo {
                id: oid.to_string(),
                message: message.into(),
                author: "test".to_string(),
            },
        );
        self.files
            .insert(oid, files.iter().map(|f| f.to_string()).collect());
        self.branch_heads.insert(self.current.clone(), oid);
        oid
    }

    /// Switch to `branch`, creating it at the current head if new.
    pub fn checkout(&mut self, branch: impl Into<String>) {
        let branch = branch.into();
        if !self.branch_heads.contains_key(&branch) {
            if let Some(head) = self.branch_heads.get(&self.current).copied() {
                self.branch_heads.insert(branch.clone(), head);
            }
        }
        self.current = branch;
    }

    /// Tag the current head.
    pub fn tag(&mut self, name: impl Into<String>) {
        let target = self
            .branch_heads
            .get(&self.current)
            .copied()
            .expect("cannot tag an empty history");
        self.tags.push(TagRef {
            name: name.into(),
            target,
        });
    }

    /// Tag an arbitrary commit.
    pub fn tag_at(&mut self, name: impl Into<String>, target: Oid) {
        self.tags.push(TagRef {
            name: name.into(),
            target,
        });
    }

    pub fn set_shallow(&mut self, shallow: bool) {
        self.shallow = shallow;
    }

    fn index_of(&self, oid: Oid) -> Result<usize> {
        self.chain
            .iter()
            .position(|&c| c == oid)
            .ok_or_else(|| MonoverError::tag(format!("Unknown commit: {}", oid)))
    }
}

impl Default for MockHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GitHistory for MockHistory {
    fn current_branch(&self) -> Result<String> {
        Ok(self.current.clone())
    }

    fn head_of(&self, branch: &str) -> Result<Oid> {
        self.branch_heads
            .get(branch)
            .copied()
            .ok_or_else(|| MonoverError::branch(format!("Branch not found: {}", branch)))
    }

    fn list_tags(&self) -> Result<Vec<TagRef>> {
        Ok(self.tags.clone())
    }

    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>> {
        let end = self.index_of(to)?;
        let start = match from {
            Some(from) => self.index_of(from)? + 1,
            None => 0,
        };
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self.chain[start..=end]
            .iter()
            .map(|oid| self.commits[oid].clone())
            .collect())
    }

    fn changed_files_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<String>> {
        let end = self.index_of(to)?;
        let start = match from {
            Some(from) => self.index_of(from)? + 1,
            None => 0,
        };
        if start > end {
            return Ok(Vec::new());
        }
        let mut files: Vec<String> = self.chain[start..=end]
            .iter()
            .flat_map(|oid| self.files[oid].iter().cloned())
            .collect();
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn is_ancestor(&self, candidate: Oid, tip: Oid) -> Result<bool> {
        Ok(self.index_of(candidate)? <= self.index_of(tip)?)
    }

    fn is_shallow(&self) -> bool {
        self.shallow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_advances_branch() {
        let mut history = MockHistory::new();
        let first = history.commit("init", &["readme.md"]);
        let second = history.commit("more", &["src/lib.rs"]);
        assert_eq!(history.head_of("main").unwrap(), second);
        assert!(history.is_ancestor(first, second).unwrap());
        assert!(!history.is_ancestor(second, first).unwrap());
    }

    #[test]
    fn test_commits_between_is_exclusive_inclusive() {
        let mut history = MockHistory::new();
        let a = history.commit("a", &[]);
        let _b = history.commit("b", &[]);
        let c = history.commit("c", &[]);

        let range = history.commits_between(Some(a), c).unwrap();
        let messages: Vec<&str> = range.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["b", "c"]);

        let all = history.commits_between(None, c).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_changed_files_union() {
        let mut history = MockHistory::new();
        let a = history.commit("a", &["x.rs"]);
        history.commit("b", &["y.rs", "x.rs"]);
        let c = history.commit("c", &["z.rs"]);

        let files = history.changed_files_between(Some(a), c).unwrap();
        assert_eq!(files, vec!["x.rs", "y.rs", "z.rs"]);
    }

    #[test]
    fn test_checkout_forks_at_head() {
        let mut history = MockHistory::new();
        let base = history.commit("base", &[]);
        history.checkout("feature/x");
        let feat = history.commit("feat work", &[]);

        assert_eq!(history.head_of("main").unwrap(), base);
        assert_eq!(history.head_of("feature/x").unwrap(), feat);
        assert_eq!(history.current_branch().unwrap(), "feature/x");
    }

    #[test]
    fn test_tags() {
        let mut history = MockHistory::new();
        let first = history.commit("init", &[]);
        history.tag("v1.0.0");
        history.commit("next", &[]);

        let tags = history.list_tags().unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "v1.0.0");
        assert_eq!(tags[0].target, first);
    }

    #[test]
    fn test_commit_height_via_default_method() {
        let mut history = MockHistory::new();
        let a = history.commit("a", &[]);
        history.commit("b", &[]);
        let c = history.commit("c", &[]);
        assert_eq!(history.commit_height(Some(a), c).unwrap(), 2);
    }
}
