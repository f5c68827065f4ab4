//! In-memory commit graph for unit tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use super::Backend;
use crate::error::{AnnounceError, Result};

/// Scripted history. Commits are recorded in creation order, which doubles
/// as their age: later commits are newer.
#[derive(Default)]
pub(crate) struct FakeBackend {
    order: Vec<String>,
    parents: HashMap<String, Vec<String>>,
    branches: RefCell<HashMap<String, String>>,
    pub checkouts: RefCell<Vec<String>>,
    pub what_changed_calls: Cell<usize>,
    pub diff_calls: Cell<usize>,
    pub refreshes: Cell<usize>,
    pub fail_refresh: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit with the given parents
    pub fn commit(&mut self, hash: &str, parents: &[&str]) -> &mut Self {
        self.order.push(hash.to_string());
        self.parents.insert(
            hash.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Point a branch at a commit
    pub fn branch(&mut self, name: &str, tip: &str) -> &mut Self {
        self.branches
            .borrow_mut()
            .insert(name.to_string(), tip.to_string());
        self
    }

    /// Move a branch after construction, simulating new upstream work
    pub fn advance(&self, name: &str, tip: &str) {
        self.branches
            .borrow_mut()
            .insert(name.to_string(), tip.to_string());
    }

    fn lookup(&self, rev: &str) -> Result<String> {
        if let Some(tip) = self.branches.borrow().get(rev) {
            return Ok(tip.clone());
        }
        if self.parents.contains_key(rev) {
            return Ok(rev.to_string());
        }
        Err(AnnounceError::UnresolvableRevision(rev.to_string()))
    }

    fn ancestors(&self, hash: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![hash.to_string()];
        while let Some(current) = stack.pop() {
            if seen.insert(current.clone()) {
                if let Some(parents) = self.parents.get(&current) {
                    stack.extend(parents.iter().cloned());
                }
            }
        }
        seen
    }
}

impl Backend for FakeBackend {
    fn resolve(&self, rev: &str) -> Result<String> {
        self.lookup(rev)
    }

    fn commits_between(&self, since: &str, until: &str) -> Result<Vec<String>> {
        let hidden = self.ancestors(&self.lookup(since)?);
        let reachable = self.ancestors(&self.lookup(until)?);

        Ok(self
            .order
            .iter()
            .rev()
            .filter(|hash| reachable.contains(*hash) && !hidden.contains(*hash))
            .cloned()
            .collect())
    }

    fn parent(&self, commit: &str) -> Result<Option<String>> {
        let hash = self.lookup(commit)?;
        Ok(self.parents.get(&hash).and_then(|p| p.first().cloned()))
    }

    fn what_changed(&self, commit: &str) -> Result<String> {
        self.what_changed_calls.set(self.what_changed_calls.get() + 1);
        let hash = self.lookup(commit)?;
        Ok(format!("commit {}\n:000000 100644 A\tfile-{}", hash, hash))
    }

    fn diff(&self, from: Option<&str>, to: &str) -> Result<String> {
        self.diff_calls.set(self.diff_calls.get() + 1);
        let to = self.lookup(to)?;
        match from {
            Some(from) => Ok(format!("diff {}..{}", self.lookup(from)?, to)),
            None => Ok(format!("diff empty..{}", to)),
        }
    }

    fn has_local_branch(&self, name: &str) -> Result<bool> {
        Ok(self.branches.borrow().contains_key(name))
    }

    fn checkout(&self, branch: &str) -> Result<()> {
        if !self.branches.borrow().contains_key(branch) {
            return Err(AnnounceError::UnresolvableRevision(branch.to_string()));
        }
        self.checkouts.borrow_mut().push(branch.to_string());
        Ok(())
    }

    fn refresh(&self) -> Result<()> {
        self.refreshes.set(self.refreshes.get() + 1);
        if self.fail_refresh {
            return Err(AnnounceError::BackendUnavailable(
                "remote unreachable".to_string(),
            ));
        }
        Ok(())
    }
}
