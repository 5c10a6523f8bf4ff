//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use smartfarm_cli::commands::ConfigAction;
use smartfarm_cli::format::OutputFormat;
use smartfarm_types::TimeRange;

#[derive(Parser)]
#[command(name = "smartfarm")]
#[command(author, version, about = "Dashboard for Smart Farm field sensors", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Realtime database root URL
    #[arg(long, global = true, env = "SMARTFARM_DATABASE_URL")]
    pub database_url: Option<String>,

    /// Device path inside the database
    #[arg(short, long, global = true, env = "SMARTFARM_DEVICE")]
    pub device: Option<String>,

    /// Use simulated readings instead of the database
    #[arg(long, global = true)]
    pub demo: bool,

    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colored output (any non-empty `NO_COLOR` value counts)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Reusable output arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Omit header row in CSV output (useful for appending)
    #[arg(long)]
    pub no_header: bool,

    /// Output compact JSON (no pretty-printing)
    #[arg(long)]
    pub compact: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive terminal dashboard (default)
    #[cfg(feature = "tui")]
    Dashboard {
        /// Initial time window (1h, 6h, 24h, 7d, 30d)
        #[arg(short, long)]
        range: Option<TimeRange>,
    },

    /// Print the latest reading
    Read {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Print a historical window
    History {
        /// Time window (1h, 6h, 24h, 7d, 30d)
        #[arg(short, long)]
        range: Option<TimeRange>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show or initialize the configuration file
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

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_history_args() {
        let cli = Cli::try_parse_from([
            "smartfarm", "history", "--range", "7d", "--format", "csv", "--demo",
        ])
        .unwrap();
        assert!(cli.demo);
        match cli.command {
            Some(Commands::History { range, output }) => {
                assert_eq!(range, Some(TimeRange::Week));
                assert_eq!(output.format, OutputFormat::Csv);
            }
            _ => panic!("expected history command"),
        }
    }

    #[test]
    fn test_unknown_range_is_rejected() {
        assert!(Cli::try_parse_from(["smartfarm", "history", "--range", "2h"]).is_err());
    }

    #[test]
    fn test_no_subcommand_means_dashboard() {
        let cli = Cli::try_parse_from(["smartfarm", "--device", "devices/a"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.device.as_deref(), Some("devices/a"));
    }

    #[test]
    fn test_config_init_force() {
        let cli = Cli::try_parse_from(["smartfarm", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Init { force: true }
            })
        ));
    }
}
