//! Command-line interface for fastfoodz.
//!
//! This module provides the CLI structure for the `foodz` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::Verbosity;

pub use commands::{
    ConfigCommand, ListCommand, OutputFormat, PruneCommand, RefreshCommand, ShowCommand,
    SnapshotsCommand, StatusCommand,
};

/// foodz - Find fast food nearby
///
/// Searches for nearby pizza, Mexican, Chinese and burger places, keeps the
/// latest results in a local cache, and lists them.
#[derive(Debug, Parser)]
#[command(name = "foodz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch nearby businesses and store them as a new snapshot
    Refresh(RefreshCommand),

    /// List businesses from the current snapshot
    List(ListCommand),

    /// Show details for one business
    Show(ShowCommand),

    /// List cached snapshots
    Snapshots(SnapshotsCommand),

    /// Delete old snapshots
    Prune(PruneCommand),

    /// Show cache status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn status_cli(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "foodz");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(status_cli(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(status_cli(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(status_cli(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(status_cli(3, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_parse_refresh_with_negative_longitude() {
        let cli =
            Cli::try_parse_from(["foodz", "refresh", "--lat", "40.7", "--lon", "-73.9", "-r", "800"])
                .unwrap();
        match cli.command {
            Command::Refresh(cmd) => {
                assert_eq!(cmd.lat, Some(40.7));
                assert_eq!(cmd.lon, Some(-73.9));
                assert_eq!(cmd.radius, Some(800));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_refresh_defaults() {
        let cli = Cli::try_parse_from(["foodz", "refresh"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Refresh(RefreshCommand {
                lat: None,
                lon: None,
                radius: None
            })
        ));
    }

    #[test]
    fn test_parse_list_format() {
        let cli = Cli::try_parse_from(["foodz", "list", "--format", "json"]).unwrap();
        match cli.command {
            Command::List(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["foodz", "show", "joes-id"]).unwrap();
        assert!(matches!(cli.command, Command::Show(ShowCommand { ref business_id, .. }) if business_id == "joes-id"));
    }

    #[test]
    fn test_parse_prune_all_conflicts_with_keep() {
        assert!(Cli::try_parse_from(["foodz", "prune", "--all", "--keep", "3"]).is_err());
        assert!(Cli::try_parse_from(["foodz", "prune", "--keep", "3"]).is_ok());
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["foodz", "-c", "/custom/config.toml", "status"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["foodz", "-v", "status"]).unwrap();
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["foodz", "-q", "status"]).unwrap();
        assert!(cli.quiet);
    }
}
