//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific
//! modules.

mod harvest;
mod init;
mod plan;
mod runner;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "redh")]
#[command(about = "Feed harvester with jittered daily scheduling")]
#[command(version)]
pub struct Cli {
    /// Data directory (overrides REDHARVEST_DATA_DIR and the default)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory, config file, and database
    Init,

    /// Run one harvest cycle now
    Harvest {
        /// Feed names to harvest (defaults to configured feeds)
        feeds: Vec<String>,
        /// Harvest all configured feeds
        #[arg(short, long)]
        all: bool,
        /// New candidates to aim for per feed
        #[arg(short, long)]
        target: Option<usize>,
        /// Number of feeds processed concurrently
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Run continuously on the jittered daily schedule
    Run,

    /// Print a sample day plan and exit
    Plan,

    /// Show per-feed harvest counts
    Status,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = load_settings(cli.data_dir)?;

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Harvest {
            feeds,
            all,
            target,
            workers,
        } => harvest::cmd_harvest(&settings, &feeds, all, target, workers).await,
        Commands::Run => runner::cmd_run(&settings).await,
        Commands::Plan => plan::cmd_plan(&settings),
        Commands::Status => status::cmd_status(&settings).await,
    }
}
