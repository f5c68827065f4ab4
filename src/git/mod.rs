//! Git operations module
//!
//! Provides:
//! - The `Backend` trait: every history query the announcer needs
//! - A libgit2 implementation of it (`GitRepository`)

pub mod repository;

#[cfg(test)]
pub(crate) mod fake;

pub use repository::GitRepository;

use crate::error::Result;

/// Read-mostly view of a version-controlled tree.
///
/// Revisions are passed around as strings: branch names or commit hashes,
/// possibly abbreviated. Every operation is a blocking query.
pub trait Backend {
    /// Resolve `rev` to exactly one commit and return its full hash.
    ///
    /// Fails with `UnresolvableRevision` when the name is unknown or ambiguous.
    fn resolve(&self, rev: &str) -> Result<String>;

    /// Commits reachable from `until` but not from `since`, newest first.
    fn commits_between(&self, since: &str, until: &str) -> Result<Vec<String>>;

    /// First parent of `commit`, or `None` for a root commit.
    fn parent(&self, commit: &str) -> Result<Option<String>>;

    /// Change summary of a single commit: header, message and touched paths.
    fn what_changed(&self, commit: &str) -> Result<String>;

    /// Textual diff from `from` to `to`. `None` diffs against the empty tree.
    fn diff(&self, from: Option<&str>, to: &str) -> Result<String>;

    /// Whether `name` is a local branch (as opposed to a remote branch or hash).
    fn has_local_branch(&self, name: &str) -> Result<bool>;

    /// Switch the working tree to `branch`.
    fn checkout(&self, branch: &str) -> Result<()>;

    /// Fetch from the remote and fast-forward local branches.
    fn refresh(&self) -> Result<()>;
}
