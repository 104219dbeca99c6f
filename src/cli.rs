use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands;
use crate::error::Result;

/// Bulk-delete branches from a branch listing page, using the page's own controls
#[derive(Parser)]
#[command(name = "branchsweep")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to <config dir>/branchsweep/config.toml)
    #[arg(long, global = true, env = "BRANCHSWEEP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Attach to a running browser (CDP port or ws:// URL) instead of launching one
    #[arg(long, global = true, env = "BRANCHSWEEP_CDP")]
    pub cdp: Option<String>,

    /// Launch the browser headless (only with `run` and `scan`; prompts need a window)
    #[arg(long, global = true)]
    pub headless: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a "delete all" control to the branch page and serve it until Ctrl+C
    Watch {
        /// Branch page URL, host/path, or owner/repo (defaults to an open branches tab)
        target: Option<String>,
    },

    /// Delete every deletable branch now, confirming in the terminal
    Run {
        /// Branch page URL, host/path, or owner/repo (defaults to an open branches tab)
        target: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List the branches a run would delete, without touching anything
    Scan {
        /// Branch page URL, host/path, or owner/repo (defaults to an open branches tab)
        target: Option<String>,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (defaults, file and environment merged)
    Show,
    /// Print the config file location
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Watch { target } => commands::watch::run(self, target.as_deref()).await,
            Commands::Run { target, yes } => commands::run::run(self, target.as_deref(), *yes).await,
            Commands::Scan { target } => commands::scan::run(self, target.as_deref()).await,
            Commands::Config { command } => commands::config::run(self, command).await,
        }
    }
}
