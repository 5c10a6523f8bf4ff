//! Read command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use smartfarm_core::{DevicePath, RealtimeSource, RecordQuery, Thresholds, interpret_latest};
use smartfarm_types::LiveState;

use super::write_output;
use crate::format::{
    FormatOptions, OutputFormat, format_reading_csv, format_reading_json, format_reading_text,
    local_offset,
};

/// Query the newest record once and decode it the way the live path does.
pub async fn read_latest(source: &dyn RealtimeSource, path: &DevicePath) -> Result<LiveState> {
    let snapshot = source
        .query(path, &RecordQuery::latest())
        .await
        .with_context(|| format!("Failed to read latest record at {path}"))?;
    let event = interpret_latest(&snapshot);
    debug!(?event, "Latest record decoded");
    Ok(LiveState::default().apply(&event))
}

pub async fn cmd_read(
    source: &dyn RealtimeSource,
    path: &DevicePath,
    thresholds: &Thresholds,
    format: OutputFormat,
    output: Option<&PathBuf>,
    opts: &FormatOptions,
) -> Result<()> {
    let state = read_latest(source, path).await?;

    let content = match format {
        OutputFormat::Json => format_reading_json(&state, thresholds, opts)?,
        OutputFormat::Csv => format_reading_csv(&state, opts),
        OutputFormat::Text => format_reading_text(&state, thresholds, local_offset(), opts),
    };
    write_output(output, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smartfarm_core::MockSource;
    use smartfarm_types::{LiveStatus, SensorValue};

    #[tokio::test]
    async fn test_read_latest_decodes_newest_record() {
        let source = MockSource::with_records([
            json!({
                "received_at": "2024-01-01T00:00:00Z",
                "uplink_message": { "decoded_payload": { "temperature": "19.0" } }
            }),
            json!({
                "received_at": "2024-01-01T00:05:00Z",
                "uplink_message": { "decoded_payload": {
                    "temperature": "21.3", "humidity": "55",
                    "soil_moisture": "6.2", "light_intensity": "410"
                } }
            }),
        ]);

        let state = read_latest(&source, &DevicePath::default()).await.unwrap();
        assert_eq!(state.status, LiveStatus::Ready);
        assert_eq!(state.values.temperature, SensorValue::Numeric(21.3));
        assert_eq!(state.values.light_intensity, SensorValue::Numeric(410.0));
    }

    #[tokio::test]
    async fn test_read_latest_empty_path_is_no_data() {
        let source = MockSource::new();
        let state = read_latest(&source, &DevicePath::default()).await.unwrap();
        assert_eq!(state.status, LiveStatus::NoData);
        assert!(state.values.temperature.is_missing());
    }

    #[tokio::test]
    async fn test_read_latest_failure_has_context() {
        let source = MockSource::new();
        source.set_fail_query(Some("HTTP 401: Permission denied"));
        let err = read_latest(&source, &DevicePath::new("devices/x"))
            .await
            .unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("Failed to read latest record at devices/x"));
        assert!(message.contains("Permission denied"));
    }

    #[tokio::test]
    async fn test_cmd_read_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("reading.json");
        let source = MockSource::new();

        cmd_read(
            &source,
            &DevicePath::default(),
            &Thresholds::default(),
            OutputFormat::Json,
            Some(&out),
            &FormatOptions::default(),
        )
        .await
        .unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(parsed["status"], "No data");
        assert!(parsed["values"]["humidity"].is_null());
    }
}
