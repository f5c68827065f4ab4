//! Announcer - commit reports for tracked git branches
//!
//! A library for incremental commit announcement with:
//! - A per-branch watermark file recording the last reported commit
//! - Discovery of commits that arrived since then, oldest first
//! - One plain-text mail report per commit, piped into a transport command
//! - Dry-run mode that renders reports without sending or persisting

pub mod commit;
pub mod config;
pub mod discovery;
pub mod error;
pub mod git;
pub mod notifications;
pub mod report;
pub mod revision;
pub mod runner;
pub mod state;

pub use commit::Commit;
pub use config::Config;
pub use error::{AnnounceError, Result};
pub use git::{Backend, GitRepository};
pub use notifications::{CommandSink, MemorySink, Sink};
pub use report::{Dispatcher, Report};
pub use revision::{Branch, Revision};
pub use runner::{Announcer, BranchSummary, RunOptions, RunSummary};
pub use state::WatermarkStore;
