use crate::error::Result;
use crate::git::{CommitInfo, GitHistory, TagRef};
use git2::Oid;
use std::collections::HashMap;
use std::sync::Mutex;

/// Read-through cache over any [GitHistory].
///
/// A multi-project run asks for the same tag list and overlapping commit
/// ranges once per project; this wrapper makes those walks O(history) once
/// per run instead of once per project. Scope an instance to a single run.
pub struct CachedHistory<H: GitHistory> {
    inner: H,
    tags: Mutex<Option<Vec<TagRef>>>,
    commits: Mutex<HashMap<(Option<Oid>, Oid), Vec<CommitInfo>>>,
    files: Mutex<HashMap<(Option<Oid>, Oid), Vec<String>>>,
}

impl<H: GitHistory> CachedHistory<H> {
    pub fn new(inner: H) -> Self {
        CachedHistory {
            inner,
            tags: Mutex::new(None),
            commits: Mutex::new(HashMap::new()),
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Consume the cache and return the wrapped history.
    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: GitHistory> GitHistory for CachedHistory<H> {
    fn current_branch(&self) -> Result<String> {
        self.inner.current_branch()
    }

    fn head_of(&self, branch: &str) -> Result<Oid> {
        self.inner.head_of(branch)
    }

    fn list_tags(&self) -> Result<Vec<TagRef>> {
        let mut cached = self.tags.lock().expect("tag cache poisoned");
        if let Some(tags) = cached.as_ref() {
            return Ok(tags.clone());
        }
        let tags = self.inner.list_tags()?;
        *cached = Some(tags.clone());
        Ok(tags)
    }

    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>> {
        let key = (from, to);
        {
            let cached = self.commits.lock().expect("commit cache poisoned");
            if let Some(commits) = cached.get(&key) {
                return Ok(commits.clone());
            }
        }
        let commits = self.inner.commits_between(from, to)?;
        self.commits
            .lock()
            .expect("commit cache poisoned")
            .insert(key, commits.clone());
        Ok(commits)
    }

    fn changed_files_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<String>> {
        let key = (from, to);
        {
            let cached = self.files.lock().expect("file cache poisoned");
            if let Some(files) = cached.get(&key) {
                return Ok(files.clone());
            }
        }
        let files = self.inner.changed_files_between(from, to)?;
        self.files
            .lock()
            .expect("file cache poisoned")
            .insert(key, files.clone());
        Ok(files)
    }

    fn is_ancestor(&self, candidate: Oid, tip: Oid) -> Result<bool> {
        self.inner.is_ancestor(candidate, tip)
    }

    fn is_shallow(&self) -> bool {
        self.inner.is_shallow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::MockHistory;

    #[test]
    fn test_cache_matches_inner() {
        let mut mock = MockHistory::new();
        let a = mock.commit("a", &["x.rs"]);
        mock.tag("v1.0.0");
        let b = mock.commit("b", &["y.rs"]);

        let direct_commits = mock.commits_between(Some(a), b).unwrap();
        let direct_files = mock.changed_files_between(Some(a), b).unwrap();
        let direct_tags = mock.list_tags().unwrap();

        let cached = CachedHistory::new(mock);
        for _ in 0..2 {
            assert_eq!(cached.commits_between(Some(a), b).unwrap(), direct_commits);
            assert_eq!(
                cached.changed_files_between(Some(a), b).unwrap(),
                direct_files
            );
            assert_eq!(cached.list_tags().unwrap(), direct_tags);
        }
    }

    #[test]
    fn test_cache_distinguishes_ranges() {
        let mut mock = MockHistory::new();
        let a = mock.commit("a", &["x.rs"]);
        let b = mock.commit("b", &["y.rs"]);

        let cached = CachedHistory::new(mock);
        assert_eq!(cached.changed_files_between(Some(a), b).unwrap(), vec!["y.rs"]);
        assert_eq!(
            cached.changed_files_between(None, b).unwrap(),
            vec!["x.rs", "y.rs"]
        );
    }
}
