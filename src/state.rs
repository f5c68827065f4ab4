//! Persisted per-branch watermarks
//!
//! The state file holds one `<branch> <hash>` line per tracked branch. The
//! hash is the last commit reported for that branch.

use log::debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::commit::Commit;
use crate::error::{AnnounceError, Result};
use crate::git::Backend;
use crate::revision::Branch;

/// Default state file name, relative to the configuration directory
pub const DEFAULT_STATE_FILE: &str = ".announcer.lastcommit";

/// Reads and atomically rewrites the state file
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
    local_branches_only: bool,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            local_branches_only: false,
        }
    }

    /// Reject branch names that are not local branches when loading
    pub fn local_branches_only(mut self, enabled: bool) -> Self {
        self.local_branches_only = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load watermarks in file order, verifying every branch and hash
    pub fn load(&self, backend: &dyn Backend) -> Result<Vec<Commit>> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| AnnounceError::io(&self.path, e))?;

        let mut watermarks = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let Some((branch, hash)) = self.parse_line(index + 1, line)? else {
                continue;
            };
            let branch = if self.local_branches_only {
                Branch::lookup_local(backend, branch)?
            } else {
                Branch::lookup(backend, branch)?
            };
            watermarks.push(Commit::new(backend, hash, branch)?);
        }

        debug!(
            "loaded {} watermark(s) from {}",
            watermarks.len(),
            self.path.display()
        );
        Ok(watermarks)
    }

    /// Split a line into `(branch, hash)`; `None` for a blank line
    fn parse_line<'a>(&self, line_no: usize, line: &'a str) -> Result<Option<(&'a str, &'a str)>> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.as_slice() {
            [] => Ok(None),
            [branch, hash] => Ok(Some((*branch, *hash))),
            _ => Err(AnnounceError::MalformedState {
                path: self.path.clone(),
                line_no,
                line: line.to_string(),
            }),
        }
    }

    /// Replace the state file with one line per watermark.
    ///
    /// The new content is written to a sibling temporary file and renamed
    /// over the old one, so a crash leaves the previous state intact.
    pub fn save(&self, watermarks: &[Commit]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut content = String::new();
        for watermark in watermarks {
            content.push_str(&watermark.state_line());
            content.push('\n');
        }

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AnnounceError::io(dir, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| AnnounceError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| AnnounceError::io(&self.path, e.error))?;

        debug!(
            "saved {} watermark(s) to {}",
            watermarks.len(),
            self.path.display()
        );
        Ok(())
    }
}
