use std::fs::{self, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use smartfarm_cli::commands::{cmd_config, cmd_history, cmd_read};
use smartfarm_cli::config::{Config, resolve_database_url, resolve_device, resolve_range};
use smartfarm_cli::format::FormatOptions;
use smartfarm_cli::source::{open_source, select_source};
use smartfarm_core::Thresholds;

mod cli;

use cli::{Cli, Commands, OutputArgs};

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    // Handle completions command early (before tracing init)
    if let Some(Commands::Completions { shell }) = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "smartfarm", &mut io::stdout());
        return Ok(());
    }

    init_tracing(&cli)?;

    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let config = Config::load(Some(&config_path));

    if let Some(Commands::Config { action }) = &cli.command {
        return cmd_config(action, &config_path, &config, None);
    }

    let thresholds = Thresholds::new(config.thresholds);
    let device = resolve_device(cli.device.clone(), &config);
    let kind = select_source(
        cli.demo,
        resolve_database_url(cli.database_url.clone(), &config),
    )?;
    let source = open_source(&kind, config.timeout())?;

    match cli.command {
        #[cfg(feature = "tui")]
        None => {
            let range = resolve_range(None, &config);
            smartfarm_cli::tui::run(source, device, range, thresholds, config.timeout()).await
        }
        #[cfg(not(feature = "tui"))]
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
        #[cfg(feature = "tui")]
        Some(Commands::Dashboard { range }) => {
            let range = resolve_range(range, &config);
            smartfarm_cli::tui::run(source, device, range, thresholds, config.timeout()).await
        }
        Some(Commands::Read { output }) => {
            let opts = format_options(cli.no_color, &output);
            cmd_read(
                source.as_ref(),
                &device,
                &thresholds,
                output.format,
                output.output.as_ref(),
                &opts,
            )
            .await
        }
        Some(Commands::History { range, output }) => {
            let opts = format_options(cli.no_color, &output);
            cmd_history(
                source.as_ref(),
                &device,
                resolve_range(range, &config),
                output.format,
                output.output.as_ref(),
                &opts,
            )
            .await
        }
        // Handled above.
        Some(Commands::Config { .. }) | Some(Commands::Completions { .. }) => Ok(()),
    }
}

/// Colors are off when requested or when stdout is not a terminal.
fn format_options(no_color: bool, output: &OutputArgs) -> FormatOptions {
    FormatOptions::new(no_color || !io::stdout().is_terminal())
        .with_no_header(output.no_header)
        .with_compact(output.compact)
}

/// Where dashboard logs go so they do not draw over the screen.
fn dashboard_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("smartfarm")
        .join("logs")
        .join("dashboard.log")
}

fn init_tracing(cli: &Cli) -> Result<()> {
    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let dashboard = cli.command.is_none();
    #[cfg(feature = "tui")]
    let dashboard = dashboard || matches!(cli.command, Some(Commands::Dashboard { .. }));

    if dashboard {
        let path = dashboard_log_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}
