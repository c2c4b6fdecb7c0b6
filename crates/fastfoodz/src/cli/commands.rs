//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

/// Refresh command arguments.
///
/// Unset arguments fall back to the `[search]` configuration section.
#[derive(Debug, Args)]
pub struct RefreshCommand {
    /// Latitude to search around
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude to search around
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Search radius in metres (max 40000)
    #[arg(short, long)]
    pub radius: Option<u32>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Maximum number of businesses to show
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Upstream business id
    pub business_id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Snapshots command arguments.
#[derive(Debug, Args)]
pub struct SnapshotsCommand {
    /// Maximum number of snapshots to list
    #[arg(short, long, default_value = "20")]
    pub limit: usize,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Prune command arguments.
#[derive(Debug, Args)]
pub struct PruneCommand {
    /// Keep only this many most recent snapshots (defaults to storage.keep_snapshots)
    #[arg(short, long)]
    pub keep: Option<usize>,

    /// Also delete snapshots older than this many days
    #[arg(long)]
    pub older_than_days: Option<u32>,

    /// Delete every snapshot
    #[arg(long, conflicts_with_all = ["keep", "older_than_days"])]
    pub all: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
