//! CLI Integration Tests
//!
//! These tests run the `smartfarm` binary and check output formats and
//! command behaviors. Everything runs against `--demo`, so no database is
//! needed.
//!
//! ```
//! cargo test --package smartfarm-cli --test cli_integration
//! ```

use std::path::Path;
use std::process::{Command, Output};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Run smartfarm with a private config file and a clean environment.
fn run_smartfarm(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_smartfarm"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("SMARTFARM_DATABASE_URL")
        .env_remove("SMARTFARM_DEVICE")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to run smartfarm binary")
}

fn temp_config() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_command() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["--help"]);

    assert!(output.status.success(), "Help should succeed");

    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["dashboard", "read", "history", "config", "completions"] {
        assert!(stdout.contains(cmd), "Help should list {cmd} command");
    }
    assert!(stdout.contains("--database-url"));
    assert!(stdout.contains("--demo"));
}

#[test]
fn test_version_command() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["--version"]);

    assert!(output.status.success(), "Version should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("smartfarm"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_help() {
    let (_dir, config) = temp_config();
    for cmd in ["dashboard", "read", "history", "config", "completions"] {
        let output = run_smartfarm(&config, &[cmd, "--help"]);

        assert!(output.status.success(), "{} --help should succeed", cmd);
        assert!(
            !output.stdout.is_empty(),
            "{} --help should produce output",
            cmd
        );
    }
}

#[test]
fn test_completions() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["completions", "bash"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("smartfarm"));
}

// =============================================================================
// Config Commands
// =============================================================================

#[test]
fn test_config_path() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["config", "path"]);

    assert!(output.status.success(), "Config path should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), config.display().to_string());
}

#[test]
fn test_config_init_then_show() {
    let (_dir, config) = temp_config();

    let init = run_smartfarm(&config, &["config", "init"]);
    assert!(init.status.success(), "Config init should succeed");
    assert!(config.exists());

    let again = run_smartfarm(&config, &["config", "init"]);
    assert!(!again.status.success(), "Second init should refuse");
    assert!(String::from_utf8_lossy(&again.stderr).contains("already exists"));

    let show = run_smartfarm(&config, &["config", "show"]);
    assert!(show.status.success());
    let stdout = String::from_utf8_lossy(&show.stdout);
    assert!(stdout.contains("default_range"));
    assert!(stdout.contains("[thresholds.temperature]"));
}

// =============================================================================
// Data Commands
// =============================================================================

#[test]
fn test_missing_database_url_is_explained() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["read"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No database URL configured"));
    assert!(stderr.contains("--demo"));
}

#[test]
fn test_read_demo_json() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["--demo", "read", "--format", "json"]);

    assert!(output.status.success(), "Read should succeed");
    let json: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("Read output should be JSON");
    assert_eq!(json["status"], "Live");
    assert!(json["values"]["temperature"].is_number());
    assert!(json["thresholds"]["humidity"].is_string());
}

#[test]
fn test_read_demo_text() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["--demo", "read"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Temperature"));
    assert!(stdout.contains("Light Intensity"));
}

#[test]
fn test_no_color_env_accepts_any_value() {
    let (_dir, config) = temp_config();
    for value in ["1", "yes", "true"] {
        let output = Command::new(env!("CARGO_BIN_EXE_smartfarm"))
            .arg("--config")
            .arg(&config)
            .args(["--demo", "read"])
            .env_remove("SMARTFARM_DATABASE_URL")
            .env_remove("SMARTFARM_DEVICE")
            .env("NO_COLOR", value)
            .output()
            .expect("Failed to run smartfarm binary");

        assert!(
            output.status.success(),
            "NO_COLOR={value} should be accepted: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains("\x1b["), "NO_COLOR={value} should disable color");
    }
}

#[test]
fn test_history_demo_csv() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(
        &config,
        &["--demo", "history", "--range", "1h", "--format", "csv"],
    );

    assert!(output.status.success(), "History should succeed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("timestamp,temperature,humidity,soil_moisture,light_intensity")
    );
    let timestamps: Vec<OffsetDateTime> = lines
        .map(|row| {
            let ts = row.split(',').next().unwrap();
            OffsetDateTime::parse(ts, &Rfc3339).unwrap()
        })
        .collect();
    assert!(!timestamps.is_empty());
    assert!(
        timestamps.windows(2).all(|w| w[0] <= w[1]),
        "History should be oldest first"
    );
}

#[test]
fn test_history_to_file() {
    let (dir, config) = temp_config();
    let out = dir.path().join("history.json");
    let output = run_smartfarm(
        &config,
        &[
            "--demo",
            "history",
            "--range",
            "6h",
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ],
    );

    assert!(output.status.success());
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["range"], "6h");
    assert!(json["count"].as_u64().unwrap() > 0);
}

#[test]
fn test_invalid_range_is_rejected() {
    let (_dir, config) = temp_config();
    let output = run_smartfarm(&config, &["--demo", "history", "--range", "2h"]);
    assert!(!output.status.success());
}
