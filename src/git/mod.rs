//! Git history abstraction layer
//!
//! The engine only reads history: tags, commit ranges, changed paths, and
//! reachability. Everything goes through the [GitHistory] trait so the
//! resolver can run against a real repository ([repository::Git2History]),
//! an in-memory fixture ([mock::MockHistory]), or a caching wrapper
//! ([cache::CachedHistory]) without changes.

pub mod cache;
pub mod mock;
pub mod repository;

pub use cache::CachedHistory;
pub use mock::MockHistory;
pub use repository::Git2History;

use crate::error::Result;
use git2::Oid;

/// Commit information for classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    /// Full commit id
    pub id: String,
    /// Full commit message including body and footers
    pub message: String,
    /// Author name
    pub author: String,
}

impl CommitInfo {
    /// First line of the message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}

/// A tag name together with the commit it points at (annotated tags are
/// peeled to their target commit).
#[derive(Debug, Clone, PartialEq)]
pub struct TagRef {
    pub name: String,
    pub target: Oid,
}

/// Read-only history operations the resolver depends on.
///
/// Implementors must be `Send + Sync`; a multi-project run shares one
/// instance across worker threads.
pub trait GitHistory: Send + Sync {
    /// Name of the currently checked-out branch.
    fn current_branch(&self) -> Result<String>;

    /// The commit at the tip of a branch.
    fn head_of(&self, branch: &str) -> Result<Oid>;

    /// All tags in the repository with their peeled targets.
    fn list_tags(&self) -> Result<Vec<TagRef>>;

    /// Commits reachable from `to` but not from `from`, oldest first.
    /// `from = None` walks the full history below `to`.
    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>>;

    /// Repository-relative paths touched between two commits. A submodule
    /// pointer change surfaces as the submodule's path.
    fn changed_files_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<String>>;

    /// Whether `candidate` is an ancestor of (or equal to) `tip`.
    fn is_ancestor(&self, candidate: Oid, tip: Oid) -> Result<bool>;

    /// Whether the repository has truncated history.
    fn is_shallow(&self) -> bool;

    /// Number of commits on `to` since `from`.
    fn commit_height(&self, from: Option<Oid>, to: Oid) -> Result<usize> {
        Ok(self.commits_between(from, to)?.len())
    }
}
