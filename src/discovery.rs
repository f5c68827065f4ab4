//! New-commit discovery
//!
//! For a watermark, finds the commits that arrived on its branch since the
//! last run and returns them oldest first, ready to be reported.

use log::debug;

use crate::commit::Commit;
use crate::error::Result;
use crate::git::Backend;

/// Commits on the watermark's branch that are not yet reported, oldest first.
///
/// With `checkout` set, the branch is checked out before querying it.
pub fn discover(backend: &dyn Backend, watermark: &Commit, checkout: bool) -> Result<Vec<Commit>> {
    let branch = watermark.branch();
    if checkout {
        backend.checkout(branch.name())?;
    }

    let mut commits = watermark.new_commits_since(backend, branch)?;
    commits.reverse();

    debug!("{}: {} new commit(s) since {}", branch, commits.len(), watermark.hash());
    Ok(commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::fake::FakeBackend;
    use crate::revision::Branch;

    fn hashes(commits: &[Commit]) -> Vec<&str> {
        commits.iter().map(|c| c.hash()).collect()
    }

    fn watermark(backend: &FakeBackend, branch: &str, hash: &str) -> Commit {
        Commit::new(backend, hash, Branch::lookup(backend, branch).unwrap()).unwrap()
    }

    #[test]
    fn test_single_new_commit() {
        let mut backend = FakeBackend::new();
        backend
            .commit("abc123", &[])
            .commit("def456", &["abc123"])
            .branch("main", "def456");

        let commits = discover(&backend, &watermark(&backend, "main", "abc123"), false).unwrap();
        assert_eq!(hashes(&commits), vec!["def456"]);
    }

    #[test]
    fn test_oldest_first() {
        let mut backend = FakeBackend::new();
        backend
            .commit("c1", &[])
            .commit("c2", &["c1"])
            .commit("c3", &["c2"])
            .commit("c4", &["c3"])
            .branch("main", "c4");

        let commits = discover(&backend, &watermark(&backend, "main", "c1"), false).unwrap();
        assert_eq!(hashes(&commits), vec!["c2", "c3", "c4"]);
        assert!(commits.iter().all(|c| c.branch().name() == "main"));
    }

    #[test]
    fn test_up_to_date_branch_is_empty() {
        let mut backend = FakeBackend::new();
        backend.commit("abc123", &[]).branch("main", "abc123");
        let mark = watermark(&backend, "main", "abc123");

        assert!(discover(&backend, &mark, false).unwrap().is_empty());
        assert!(discover(&backend, &mark, false).unwrap().is_empty());
    }

    #[test]
    fn test_merged_side_branch_excludes_watermark_ancestors() {
        // c1 - c2 ------ m
        //   \         /
        //    s1 ---- s2
        let mut backend = FakeBackend::new();
        backend
            .commit("c1", &[])
            .commit("s1", &["c1"])
            .commit("c2", &["c1"])
            .commit("s2", &["s1"])
            .commit("m", &["c2", "s2"])
            .branch("main", "m");

        let commits = discover(&backend, &watermark(&backend, "main", "c2"), false).unwrap();
        assert_eq!(hashes(&commits), vec!["s1", "s2", "m"]);
    }

    #[test]
    fn test_checkout_only_when_enabled() {
        let mut backend = FakeBackend::new();
        backend.commit("abc123", &[]).branch("main", "abc123");
        let mark = watermark(&backend, "main", "abc123");

        discover(&backend, &mark, false).unwrap();
        assert!(backend.checkouts.borrow().is_empty());

        discover(&backend, &mark, true).unwrap();
        assert_eq!(*backend.checkouts.borrow(), vec!["main".to_string()]);
    }
}
