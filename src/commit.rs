//! Commits tied to the branch they are reported on

use std::cell::OnceCell;
use std::fmt;

use crate::error::{AnnounceError, Result};
use crate::git::Backend;
use crate::revision::{Branch, Revision};

/// A commit as a reporting unit.
///
/// Identity is the pair (hash, branch): the same hash reached through two
/// branches yields two reports. Backend answers are cached per instance.
#[derive(Debug, Clone)]
pub struct Commit {
    revision: Revision,
    branch: Branch,
    parent: OnceCell<Option<String>>,
    what_changed: OnceCell<String>,
}

impl Commit {
    /// Create a commit on `branch`, verifying the hash against the backend
    pub fn new(backend: &dyn Backend, hash: &str, branch: Branch) -> Result<Self> {
        Ok(Self::from_revision(Revision::new(backend, hash)?, branch))
    }

    /// Create a commit from a hash the backend just produced
    pub fn trusted(hash: &str, branch: Branch) -> Self {
        Self::from_revision(Revision::trusted(hash), branch)
    }

    fn from_revision(revision: Revision, branch: Branch) -> Self {
        Self {
            revision,
            branch,
            parent: OnceCell::new(),
            what_changed: OnceCell::new(),
        }
    }

    pub fn hash(&self) -> &str {
        self.revision.name()
    }

    pub fn branch(&self) -> &Branch {
        &self.branch
    }

    /// Single-commit change summary, fetched once
    pub fn what_changed(&self, backend: &dyn Backend) -> Result<&str> {
        if let Some(text) = self.what_changed.get() {
            return Ok(text.as_str());
        }
        let text = backend.what_changed(self.hash())?;
        Ok(self.what_changed.get_or_init(|| text).as_str())
    }

    /// Diff from `other` to this commit
    pub fn diff_against(&self, backend: &dyn Backend, other: &Commit) -> Result<String> {
        backend.diff(Some(other.hash()), self.hash())
    }

    /// Immediate parent on the same branch, without re-verification.
    ///
    /// Fails with `NoParent` for a root commit.
    pub fn parent(&self, backend: &dyn Backend) -> Result<Commit> {
        let parent = match self.parent.get() {
            Some(parent) => parent.clone(),
            None => {
                let parent = backend.parent(self.hash())?;
                self.parent.get_or_init(|| parent).clone()
            }
        };

        parent
            .map(|hash| Commit::trusted(&hash, self.branch.clone()))
            .ok_or_else(|| AnnounceError::NoParent(self.hash().to_string()))
    }

    /// Diff against the immediate parent, or against the empty tree for a root commit
    pub fn diff(&self, backend: &dyn Backend) -> Result<String> {
        match self.parent(backend) {
            Ok(parent) => self.diff_against(backend, &parent),
            Err(e) if e.is_no_parent() => backend.diff(None, self.hash()),
            Err(e) => Err(e),
        }
    }

    /// Commits reachable from `tip` but not from this commit, newest first
    pub fn new_commits_since(&self, backend: &dyn Backend, tip: &Branch) -> Result<Vec<Commit>> {
        backend
            .commits_between(self.hash(), tip.name())?
            .iter()
            .map(|hash| Commit::new(backend, hash, tip.clone()))
            .collect()
    }

    /// The `<branch> <hash>` line persisted for this commit as a watermark
    pub fn state_line(&self) -> String {
        format!("{} {}", self.branch, self.hash())
    }
}

impl PartialEq for Commit {
    fn eq(&self, other: &Self) -> bool {
        self.revision == other.revision && self.branch == other.branch
    }
}

impl Eq for Commit {}

impl fmt::Display for Commit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.branch, self.hash())
    }
}
