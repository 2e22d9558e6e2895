//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const LONG_ABOUT: &str = "\
Home Assistant records hourly energy statistics for the Energy dashboard but \
has no REST endpoint for them. This tool queries the websocket API the \
frontend uses, fetching the hourly change of one energy sensor for each of \
the last N days, and prints the results with per-hour averages as a table, \
a CSV file or a plain list.";

/// Home Assistant connection arguments
#[derive(Debug, Clone, Default, Args)]
pub struct ConnectionArgs {
    /// Home Assistant base URL, e.g. http://localhost:8123
    #[arg(long, env = "POWERTRACKER_URL")]
    pub url: Option<String>,

    /// Long-lived access token
    #[arg(long, env = "POWERTRACKER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Energy sensor entity ID, e.g. sensor.energy_import
    #[arg(long, env = "POWERTRACKER_SENSOR_ID")]
    pub sensor_id: Option<String>,

    /// Skip TLS certificate verification
    #[arg(short, long)]
    pub insecure: bool,

    /// Seconds to wait for each statistics response
    #[arg(short = 'T', long)]
    pub timeout: Option<u64>,
}

/// Report shape arguments
#[derive(Debug, Clone, Default, Args)]
pub struct ReportArgs {
    /// Number of days to compute power stats for [default: 30]
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: Option<u32>,

    /// Output format (text, table, csv) [default: table]
    #[arg(short, long)]
    pub output: Option<String>,

    /// The path of the CSV file to write to [default: results.csv]
    #[arg(short = 'f', long)]
    pub csv_file: Option<PathBuf>,
}

#[derive(Parser)]
#[command(name = "powertracker")]
#[command(author, version, about = "Summarise hourly power usage recorded by Home Assistant", long_about = LONG_ABOUT)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path
    #[arg(short, long, global = true, env = "POWERTRACKER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub report: ReportArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Configuration subcommands
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum ConfigAction {
    /// Show current configuration (token masked)
    Show,

    /// Show configuration file path
    Path,

    /// Run the interactive setup and overwrite the configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_report_flags() {
        let cli = Cli::try_parse_from([
            "powertracker",
            "-d",
            "7",
            "-o",
            "csv",
            "-f",
            "out.csv",
            "--sensor-id",
            "sensor.energy_import",
            "-i",
        ])
        .unwrap();
        assert_eq!(cli.report.days, Some(7));
        assert_eq!(cli.report.output.as_deref(), Some("csv"));
        assert_eq!(cli.report.csv_file, Some(PathBuf::from("out.csv")));
        assert_eq!(
            cli.connection.sensor_id.as_deref(),
            Some("sensor.energy_import")
        );
        assert!(cli.connection.insecure);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_zero_days_rejected() {
        assert!(Cli::try_parse_from(["powertracker", "--days", "0"]).is_err());
    }

    #[test]
    fn test_config_subcommand() {
        let cli = Cli::try_parse_from(["powertracker", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Path
            })
        ));
    }
}
