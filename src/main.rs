use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{debug, LevelFilter};
use std::path::PathBuf;

use announcer::config::CONFIG_FILE;
use announcer::{Announcer, CommandSink, Config, GitRepository, RunOptions};

#[derive(Parser)]
#[command(name = "announcer")]
#[command(about = "Send one report per new commit on each tracked branch")]
#[command(version)]
struct Cli {
    /// Do not pull from the remote before looking for new commits
    #[arg(short = 'n', long)]
    no_pull: bool,

    /// Render reports but neither send them nor update the state file
    #[arg(short = 'd', long)]
    dry_run: bool,

    /// Path to config file (default: announcer.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn setup_logging(debug_logging: bool) {
    let level = if debug_logging {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load(&config_path)
        .with_context(|| format!("Could not load {}", config_path.display()))?;

    setup_logging(config.debug_logging);
    debug!("using state file {}", config.state_file.display());

    let backend = GitRepository::open(&config.repository, &config.remote)
        .context("Could not open repository")?;
    let sink = CommandSink::new(&config.transport_command);

    let options = RunOptions {
        refresh: !cli.no_pull,
        dry_run: cli.dry_run,
    };

    let mut announcer = Announcer::new(config, backend, sink);
    let summary = announcer.run(options)?;
    summary.print();

    Ok(())
}
