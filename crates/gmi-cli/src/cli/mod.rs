//! CLI for the GMI game mod installer.

mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::{Parser, Subcommand};
use gmi_core::config;
use std::path::PathBuf;

use commands::{run_cache, run_checksum, run_install, run_update};

/// Top-level CLI for the GMI installer.
#[derive(Debug, Parser)]
#[command(name = "gmi")]
#[command(about = "GMI: game mod installer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run the full install pipeline.
    Install {
        /// Install into this directory instead of the configured/current one.
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,
    },

    /// Check the release feed for a newer installer build.
    Update {
        /// Download the new installer and hand off to the updater.
        #[arg(long)]
        apply: bool,
    },

    /// Inspect or clear the download cache.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Compute SHA-256 of a file (e.g. a downloaded archive).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show the cache location and total size.
    Size,
    /// Delete all cached downloads.
    Clear,
}

impl CliCommand {
    pub fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Install { target } => run_install(&cfg, target)?,
            CliCommand::Update { apply } => run_update(&cfg, apply)?,
            CliCommand::Cache { action } => run_cache(&action)?,
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(())
    }
}
