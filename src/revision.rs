//! Verified handles to points in history

use std::fmt;

use crate::error::{AnnounceError, Result};
use crate::git::Backend;

/// A branch tip or commit name known to resolve in the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Revision {
    name: String,
}

impl Revision {
    /// Create a revision, verifying that the backend resolves it
    pub fn new(backend: &dyn Backend, name: &str) -> Result<Self> {
        let revision = Self::trusted(name);
        revision.verify(backend)?;
        Ok(revision)
    }

    /// Create a revision without asking the backend.
    ///
    /// Only for names the backend itself just produced.
    pub fn trusted(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Fails with `UnresolvableRevision` unless the name maps to exactly one commit
    pub fn verify(&self, backend: &dyn Backend) -> Result<()> {
        backend.resolve(&self.name).map(|_| ())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A tracked branch
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Branch {
    revision: Revision,
}

impl Branch {
    /// Look up a branch by name; it must currently resolve to a tip
    pub fn lookup(backend: &dyn Backend, name: &str) -> Result<Self> {
        Ok(Self {
            revision: Revision::new(backend, name)?,
        })
    }

    /// Like `lookup`, but the name must also be a local branch, which is
    /// what checkout needs
    pub fn lookup_local(backend: &dyn Backend, name: &str) -> Result<Self> {
        let branch = Self::lookup(backend, name)?;
        if !backend.has_local_branch(name)? {
            return Err(AnnounceError::UnresolvableRevision(format!(
                "{} (not a local branch)",
                name
            )));
        }
        Ok(branch)
    }

    pub fn name(&self) -> &str {
        self.revision.name()
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
