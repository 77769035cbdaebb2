//! `branchsync init [--path <file>] [--force]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use branchsync_core::config;

/// Write a starter config file.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the file (default: ~/.branchsync/config.yaml).
    #[arg(long, value_name = "FILE")]
    pub path: Option<PathBuf>,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let path = match self.path {
            Some(path) => path,
            None => config::config_path().context("could not determine config location")?,
        };
        let written = config::write_starter(&path, self.force)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!("✓ Wrote starter config to {}", written.display());
        println!("  Edit jenkins.url, repository_path and naming before running `branchsync sync`.");
        Ok(())
    }
}
