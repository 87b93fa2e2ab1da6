use crate::error::{MonoverError, Result};
use crate::git::{CommitInfo, TagRef};
use git2::{BranchType, Oid, Repository};
use std::path::Path;

/// History adapter backed by a real repository via the `git2` crate.
pub struct Git2History {
    repo: Repository,
}

impl Git2History {
    /// Open a repository at or above `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path.as_ref()).map_err(|e| {
            MonoverError::RepositoryNotFound(format!(
                "{}: {}",
                path.as_ref().display(),
                e.message()
            ))
        })?;
        Ok(Git2History { repo })
    }

    /// Open the repository containing the current working directory.
    pub fn discover() -> Result<Self> {
        Self::open(".")
    }

    fn tree_of(&self, oid: Oid) -> Result<git2::Tree<'_>> {
        let commit = self.repo.find_commit(oid)?;
        Ok(commit.tree()?)
    }
}

impl super::GitHistory for Git2History {
    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        head.shorthand()
            .map(|s| s.to_string())
            .ok_or_else(|| MonoverError::branch("HEAD is not a named branch"))
    }

    fn head_of(&self, branch: &str) -> Result<Oid> {
        let branch = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|e| MonoverError::branch(format!("Cannot find branch '{}': {}", branch, e)))?;
        branch
            .get()
            .target()
            .ok_or_else(|| MonoverError::branch("Branch has no target commit"))
    }

    fn list_tags(&self) -> Result<Vec<TagRef>> {
        let names = self.repo.tag_names(None)?;
        let mut tags = Vec::new();

        for name in names.iter().flatten() {
            let reference = match self.repo.find_reference(&format!("refs/tags/{}", name)) {
                Ok(r) => r,
                Err(_) => continue,
            };
            // Peel annotated tags down to the commit they point at
            if let Ok(object) = reference.peel(git2::ObjectType::Commit) {
                tags.push(TagRef {
                    name: name.to_string(),
                    target: object.id(),
                });
            }
        }

        Ok(tags)
    }

    fn commits_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(to)?;
        if let Some(from) = from {
            revwalk.hide(from)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitInfo {
                id: oid.to_string(),
                message: commit.message().unwrap_or("").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
            });
        }

        // Revwalk yields newest first; callers expect chronological order
        commits.reverse();
        Ok(commits)
    }

    fn changed_files_between(&self, from: Option<Oid>, to: Oid) -> Result<Vec<String>> {
        let to_tree = self.tree_of(to)?;
        let from_tree = match from {
            Some(oid) => Some(self.tree_of(oid)?),
            None => None,
        };

        let diff =
            self.repo
                .diff_tree_to_tree(from_tree.as_ref(), Some(&to_tree), None)?;

        let mut files = Vec::new();
        for delta in diff.deltas() {
            // Submodule pointer changes appear as deltas on the submodule path
            if let Some(path) = delta.new_file().path() {
                files.push(path.to_string_lossy().into_owned());
            }
            if let Some(path) = delta.old_file().path() {
                let path = path.to_string_lossy().into_owned();
                if files.last() != Some(&path) {
                    files.push(path);
                }
            }
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    fn is_ancestor(&self, candidate: Oid, tip: Oid) -> Result<bool> {
        if candidate == tip {
            return Ok(true);
        }
        Ok(self.repo.graph_descendant_of(tip, candidate)?)
    }

    fn is_shallow(&self) -> bool {
        self.repo.is_shallow()
    }
}

// SAFETY: Git2History wraps git2::Repository, which is thread-safe for the
// read operations this trait exposes via libgit2's internal locking.
unsafe impl Sync for Git2History {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_path_is_repository_not_found() {
        let result = Git2History::open("/definitely/not/a/repository");
        assert!(matches!(
            result,
            Err(MonoverError::RepositoryNotFound(_))
        ));
    }
}
