//! Command implementations for the CLI.

mod config;
mod history;
mod read;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use config::{ConfigAction, cmd_config};
pub use history::cmd_history;
pub use read::{cmd_read, read_latest};

/// Write output to file or stdout
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}
