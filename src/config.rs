use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AnnounceError, Result};
use crate::state::DEFAULT_STATE_FILE;

pub const CONFIG_FILE: &str = "announcer.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Address reports are sent from
    pub sender: String,
    /// Address reports are sent to
    pub recipient: String,
    /// Shell command each rendered report is piped into
    #[serde(default = "default_transport_command")]
    pub transport_command: String,
    #[serde(default)]
    pub debug_logging: bool,
    /// Any path inside the tracked working tree
    #[serde(default = "default_repository")]
    pub repository: PathBuf,
    /// Remote fetched from before discovery
    #[serde(default = "default_remote")]
    pub remote: String,
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Check each branch out before querying it
    #[serde(default)]
    pub checkout_branches: bool,
}

fn default_transport_command() -> String {
    "sendmail -t".to_string()
}

fn default_repository() -> PathBuf {
    PathBuf::from(".")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

impl Config {
    /// Load and validate a config file.
    ///
    /// Relative `repository` and `state_file` paths are taken relative to the
    /// directory holding the config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| AnnounceError::io(path, e))?;

        let mut config = Self::parse(&content)?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        config.repository = resolve_path(base_dir, &config.repository)?;
        config.state_file = resolve_path(base_dir, &config.state_file)?;

        Ok(config)
    }

    /// Parse and validate config text without touching paths
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| AnnounceError::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, address) in [("sender", &self.sender), ("recipient", &self.recipient)] {
            if !address.contains('@') {
                return Err(AnnounceError::Config(format!(
                    "{} must be a mail address, got '{}'",
                    field, address
                )));
            }
        }

        if self.transport_command.trim().is_empty() {
            return Err(AnnounceError::Config(
                "transport_command must not be empty".to_string(),
            ));
        }

        if self.remote.trim().is_empty() {
            return Err(AnnounceError::Config("remote must not be empty".to_string()));
        }

        Ok(())
    }
}

/// Expand `~` and `$VARS`, then anchor relative paths at `base_dir`
fn resolve_path(base_dir: &Path, path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| AnnounceError::Config(format!("Cannot expand '{}': {}", raw, e)))?;

    let expanded = PathBuf::from(expanded.into_owned());
    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        Ok(base_dir.join(expanded))
    }
}
