//! Command-line argument parsing for Media Archiver
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Media Archiver - fetch a batch of remote media into one ZIP archive
#[derive(Parser, Debug)]
#[command(
    name = "media_archiver",
    version,
    about = "Fetch a batch of remote media files into a single ZIP archive",
    long_about = "Downloads every item of a batch concurrently and writes them into one compressed archive.
The batch is all-or-nothing: if any item fails, no archive is produced."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a batch of items into one archive
    Archive(ArchiveArgs),

    /// Inspect or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the archive command
#[derive(Args, Debug, Clone, Default)]
pub struct ArchiveArgs {
    /// Item manifest: JSON array or JSON lines of {"id", "url"} objects
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Item given directly as ID=URL (repeatable)
    #[arg(long = "item", value_name = "ID=URL")]
    pub items: Vec<String>,

    /// Archive base name (written as <NAME>.zip)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Directory for the archive
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of fetches in flight
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Proxy endpoint; anything containing "socks" selects SOCKS
    #[arg(long, value_name = "ENDPOINT")]
    pub proxy: Option<String>,

    /// Disable per-item progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Extension given to each archive entry
    #[arg(short = 'e', long, value_name = "EXT")]
    pub extension: Option<String>,

    /// Replace a partial archive left behind by an interrupted run
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    ///
    /// Returns `None` when no flag was given, leaving the choice to the
    /// configuration file.
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl ArchiveArgs {
    /// Check for argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.input.is_none() && self.items.is_empty() {
            return Err("Provide items with --input FILE or --item ID=URL".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be greater than 0".to_string());
        }

        Ok(())
    }
}
