//! Run controller: refresh, load, discover, dispatch, persist

use colored::Colorize;
use log::info;

use crate::config::Config;
use crate::discovery::discover;
use crate::error::Result;
use crate::git::Backend;
use crate::notifications::Sink;
use crate::report::Dispatcher;
use crate::state::WatermarkStore;

/// Options for one invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Fetch from the remote before discovery
    pub refresh: bool,
    /// Render reports but neither deliver them nor persist watermarks
    pub dry_run: bool,
}

/// Outcome for one tracked branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSummary {
    pub branch: String,
    pub previous: String,
    pub current: String,
    pub reported: usize,
}

/// Outcome of a whole run
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub branches: Vec<BranchSummary>,
    pub persisted: bool,
}

impl RunSummary {
    pub fn total_reported(&self) -> usize {
        self.branches.iter().map(|b| b.reported).sum()
    }

    pub fn print(&self) {
        for branch in &self.branches {
            if branch.reported == 0 {
                println!(
                    "{} {} {}",
                    "•".dimmed(),
                    branch.branch.cyan(),
                    "up to date".dimmed()
                );
            } else {
                println!(
                    "{} {} {} → {} ({} commit{})",
                    "✓".green(),
                    branch.branch.cyan(),
                    branch.previous.dimmed(),
                    branch.current,
                    branch.reported,
                    if branch.reported == 1 { "" } else { "s" }
                );
            }
        }
        if !self.persisted {
            println!("{}", "State file left untouched".yellow());
        }
    }
}

/// Announces new commits on every tracked branch
pub struct Announcer<B, S> {
    config: Config,
    backend: B,
    sink: S,
}

impl<B: Backend, S: Sink> Announcer<B, S> {
    pub fn new(config: Config, backend: B, sink: S) -> Self {
        Self {
            config,
            backend,
            sink,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Run once.
    ///
    /// Any error aborts before the state file is written, so the previous
    /// watermarks stay in place and the next run retries from them.
    pub fn run(&mut self, options: RunOptions) -> Result<RunSummary> {
        if options.refresh {
            info!("refreshing from '{}'", self.config.remote);
            self.backend.refresh()?;
        }

        let store = WatermarkStore::new(&self.config.state_file)
            .local_branches_only(self.config.checkout_branches);
        let watermarks = store.load(&self.backend)?;

        let mut dispatcher = Dispatcher::new(
            &self.config.sender,
            &self.config.recipient,
            &mut self.sink,
            options.dry_run,
        );

        let mut summary = RunSummary::default();
        let mut advanced = Vec::with_capacity(watermarks.len());

        for watermark in watermarks {
            let new_commits = discover(&self.backend, &watermark, self.config.checkout_branches)?;
            let reported = new_commits.len();

            for commit in &new_commits {
                dispatcher.dispatch(&self.backend, commit)?;
            }

            let current = new_commits.into_iter().last().unwrap_or_else(|| watermark.clone());
            summary.branches.push(BranchSummary {
                branch: watermark.branch().name().to_string(),
                previous: watermark.hash().to_string(),
                current: current.hash().to_string(),
                reported,
            });
            advanced.push(current);
        }

        if options.dry_run {
            info!("dry run: not writing {}", store.path().display());
        } else {
            store.save(&advanced)?;
            summary.persisted = true;
        }

        Ok(summary)
    }
}
