//! History command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};

use smartfarm_core::{DevicePath, RealtimeSource, fetch_historical};
use smartfarm_types::TimeRange;

use super::write_output;
use crate::format::{
    FormatOptions, OutputFormat, format_history_csv, format_history_json, format_history_text,
    local_offset,
};

pub async fn cmd_history(
    source: &dyn RealtimeSource,
    path: &DevicePath,
    range: TimeRange,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let series = fetch_historical(source, path, range)
        .await
        .context("Failed to download history")?;

    let content = match format {
        OutputFormat::Json => format_history_json(&series, opts)?,
        OutputFormat::Csv => format_history_csv(&series, opts),
        OutputFormat::Text => format_history_text(&series, local_offset()),
    };
    write_output(output, &content)
}
