//! Error types shared by the announcer library

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can abort an announcer run
#[derive(Debug, Error)]
pub enum AnnounceError {
    #[error("Cannot resolve revision '{0}'")]
    UnresolvableRevision(String),

    #[error("Malformed state line {line_no} in {}: {line:?}", .path.display())]
    MalformedState {
        path: PathBuf,
        line_no: usize,
        line: String,
    },

    #[error("Commit {0} has no parent")]
    NoParent(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Failed to hand report for {commit} to '{command}': {source}")]
    Transport {
        command: String,
        commit: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AnnounceError {
    /// Check if this error marks a root commit rather than a failure
    pub fn is_no_parent(&self) -> bool {
        matches!(self, AnnounceError::NoParent(_))
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        AnnounceError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<git2::Error> for AnnounceError {
    fn from(err: git2::Error) -> Self {
        AnnounceError::BackendUnavailable(err.message().to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnnounceError>;
