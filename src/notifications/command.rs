//! Mail transport through an external command

use log::{debug, warn};
use std::io::Write;
use std::process::{Command, Stdio};

use super::Sink;
use crate::error::{AnnounceError, Result};

/// Pipes each report into `sh -c <command>`, e.g. `sendmail -t`
#[derive(Debug, Clone)]
pub struct CommandSink {
    command: String,
}

impl CommandSink {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    fn transport_error(&self, commit: &str, source: std::io::Error) -> AnnounceError {
        AnnounceError::Transport {
            command: self.command.clone(),
            commit: commit.to_string(),
            source,
        }
    }
}

impl Sink for CommandSink {
    fn deliver(&mut self, commit: &str, message: &str) -> Result<()> {
        debug!("{} < report for {}", self.command, commit);

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| self.transport_error(commit, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(message.as_bytes())
                .map_err(|e| self.transport_error(commit, e))?;
        }

        // The transport's verdict is informational only
        match child.wait() {
            Ok(status) if !status.success() => {
                warn!("'{}' exited with {} for {}", self.command, status, commit)
            }
            Ok(_) => {}
            Err(e) => warn!("failed to wait for '{}': {}", self.command, e),
        }

        Ok(())
    }
}
