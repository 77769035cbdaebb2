//! branchsync: keep Jenkins jobs and views in step with a repository's
//! remote branches.
//!
//! # Usage
//!
//! ```text
//! branchsync sync [--dry-run] [--config <file>] [overrides…]
//! branchsync plan [--config <file>] [overrides…]
//! branchsync render <branch> [--repo-url <url>] [--config <file>] [overrides…]
//! branchsync init [--path <file>] [--force]
//! ```

mod commands;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use commands::{init::InitArgs, render::RenderArgs, sync::PlanArgs, sync::SyncArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "branchsync",
    version,
    about = "Create and remove per-branch Jenkins jobs and views",
    long_about = None,
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile jobs and views with the remote branches.
    Sync(SyncArgs),

    /// Show what `sync` would change without touching the CI server.
    Plan(PlanArgs),

    /// Print the job descriptor that would be created for a branch.
    Render(RenderArgs),

    /// Write a starter config file.
    Init(InitArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Sync(args) => args.run(),
        Commands::Plan(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Init(args) => args.run(),
    }
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
