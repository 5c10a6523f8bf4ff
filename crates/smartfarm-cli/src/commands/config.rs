//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use super::write_output;
use crate::config::Config;

/// Config subcommands
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::Subcommand))]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[cfg_attr(feature = "cli", arg(long))]
        force: bool,
    },
}

pub fn cmd_config(
    action: &ConfigAction,
    path: &Path,
    config: &Config,
    output: Option<&PathBuf>,
) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
            write_output(output, &content)
        }
        ConfigAction::Path => write_output(output, &format!("{}\n", path.display())),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                bail!(
                    "Config file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Config::default().save_to(path)?;
            eprintln!("Wrote {}", path.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let init = ConfigAction::Init { force: false };

        cmd_config(&init, &path, &Config::default(), None).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), Config::default());

        let err = cmd_config(&init, &path, &Config::default(), None).unwrap_err();
        assert!(err.to_string().contains("already exists"));

        cmd_config(&ConfigAction::Init { force: true }, &path, &Config::default(), None).unwrap();
    }

    #[test]
    fn test_show_writes_toml() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("shown.toml");
        let config = Config {
            database_url: Some("https://farm-default-rtdb.firebaseio.com".to_string()),
            ..Config::default()
        };

        cmd_config(&ConfigAction::Show, &dir.path().join("c.toml"), &config, Some(&out)).unwrap();
        let shown = std::fs::read_to_string(&out).unwrap();
        assert!(shown.contains("database_url = \"https://farm-default-rtdb.firebaseio.com\""));
        assert!(shown.contains("default_range = \"24h\""));
        assert!(shown.contains("[thresholds.temperature]"));
    }
}
