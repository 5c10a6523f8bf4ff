//! Terminal dashboard and command-line interface for Smart Farm sensors.
//!
//! This crate hosts the `smartfarm` binary: a live terminal dashboard plus a
//! few one-shot commands for scripting.
//!
//! # Features
//!
//! - **Dashboard**: latest reading, threshold status, trend chart, history
//!   table and analytics, updated as the device pushes
//! - **One-shot reads**: latest reading or a historical window as text,
//!   JSON or CSV
//! - **Demo mode**: simulated readings when no database is at hand
//! - **Configuration file**: database URL, device path, default window and
//!   threshold ranges
//! - **Shell completions**: bash, zsh, fish, PowerShell and elvish
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `dashboard` | Interactive terminal dashboard (default) |
//! | `read` | Print the latest reading |
//! | `history` | Print a historical window |
//! | `config` | Show or initialize the configuration file |
//! | `completions` | Generate shell completions |
//!
//! # Configuration
//!
//! Settings live in `~/.config/smartfarm/config.toml` (or platform
//! equivalent):
//!
//! ```toml
//! database_url = "https://smart-farm-default-rtdb.firebaseio.com"
//! device_path = "devices/smart-farm-gp5/smartfarm-node-1"
//! default_range = "24h"
//! request_timeout_secs = 10
//!
//! [thresholds]
//! temperature = { min = 18.0, max = 24.0 }
//! humidity = { min = 40.0, max = 60.0 }
//! ```
//!
//! # Environment Variables
//!
//! - `SMARTFARM_DATABASE_URL`: database root URL (overridden by `--database-url`)
//! - `SMARTFARM_DEVICE`: device path (overridden by `--device`)
//! - `NO_COLOR`: disable colored output when set
//! - `RUST_LOG`: log filter when neither `-v` nor `-q` is given
//!
//! # Examples
//!
//! Open the dashboard on simulated data:
//! ```bash
//! smartfarm --demo
//! ```
//!
//! Export the last week as CSV:
//! ```bash
//! smartfarm history --range 7d --format csv --output week.csv
//! ```

pub use smartfarm_core;
pub use smartfarm_types;

pub mod commands;
pub mod config;
pub mod format;
pub mod source;

#[cfg(feature = "tui")]
pub mod tui;
