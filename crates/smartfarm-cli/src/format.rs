//! Output formatting utilities for text, JSON, and CSV output.
//!
//! Sensor values stay typed ([`SensorValue`]) until they reach this module;
//! the "N/A" and "Loading..." placeholders exist only here.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use smartfarm_core::{MetricSummary, ThresholdStatus, Thresholds, summarize};
use smartfarm_types::{HistoricalSeries, LiveState, Metric, SensorValue};

/// Placeholder for a field the source did not provide.
pub const MISSING: &str = "N/A";

/// Placeholder for a field with no update yet.
pub const LOADING: &str = "Loading...";

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
}

impl FormatOptions {
    pub fn new(no_color: bool) -> Self {
        Self {
            no_color,
            ..Self::default()
        }
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }
}

/// Display text of a value at its metric's precision, without unit.
///
/// ```
/// use smartfarm_cli::format::format_value;
/// use smartfarm_types::{Metric, SensorValue};
///
/// assert_eq!(format_value(Metric::Humidity, SensorValue::Numeric(55.0)), "55.0");
/// assert_eq!(format_value(Metric::LightIntensity, SensorValue::Numeric(410.0)), "410");
/// assert_eq!(format_value(Metric::Temperature, SensorValue::Missing), "N/A");
/// ```
#[must_use]
pub fn format_value(metric: Metric, value: SensorValue) -> String {
    match value {
        SensorValue::Numeric(v) => format!("{:.*}", metric.decimals(), v),
        SensorValue::Missing => MISSING.to_string(),
        SensorValue::Loading => LOADING.to_string(),
    }
}

/// Display text of a value followed by its unit. Placeholders get no unit.
#[must_use]
pub fn format_value_with_unit(metric: Metric, value: SensorValue) -> String {
    match value {
        SensorValue::Numeric(_) => format!("{} {}", format_value(metric, value), metric.unit()),
        _ => format_value(metric, value),
    }
}

/// CSV cell for a value: the number, or empty when missing.
#[must_use]
pub fn csv_value(metric: Metric, value: SensorValue) -> String {
    match value {
        SensorValue::Numeric(v) => format!("{:.*}", metric.decimals(), v),
        _ => String::new(),
    }
}

/// Format a threshold status, colored unless disabled.
#[must_use]
pub fn format_threshold(status: ThresholdStatus, no_color: bool) -> String {
    let label = match status {
        ThresholdStatus::Good => "GOOD",
        ThresholdStatus::Warning => "WARNING",
    };

    if no_color {
        format!("[{}]", label)
    } else {
        match status {
            ThresholdStatus::Good => format!("[{}]", label.green()),
            ThresholdStatus::Warning => format!("[{}]", label.yellow()),
        }
    }
}

/// Optimal range text for a metric, e.g. `18.0-24.0 °C`.
#[must_use]
pub fn format_range(thresholds: &Thresholds, metric: Metric) -> String {
    let range = thresholds.config().range(metric);
    format!(
        "{:.*}-{:.*} {}",
        metric.decimals(),
        range.min,
        metric.decimals(),
        range.max,
        metric.unit()
    )
}

/// Local UTC offset of this machine, UTC if it cannot be determined.
pub fn local_offset() -> UtcOffset {
    let seconds = chrono::Local::now().offset().local_minus_utc();
    UtcOffset::from_whole_seconds(seconds).unwrap_or(UtcOffset::UTC)
}

/// `YYYY-MM-DD HH:MM:SS` in the given offset.
#[must_use]
pub fn format_local(instant: OffsetDateTime, offset: UtcOffset) -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    instant.to_offset(offset).format(format).unwrap_or_default()
}

fn rfc3339(instant: OffsetDateTime) -> String {
    instant.format(&Rfc3339).unwrap_or_default()
}

/// Escape a field for CSV output.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

// ============================================================================
// Latest reading
// ============================================================================

/// Format the latest reading as text.
#[must_use]
pub fn format_reading_text(
    state: &LiveState,
    thresholds: &Thresholds,
    offset: UtcOffset,
    opts: &FormatOptions,
) -> String {
    let mut output = format!("Status:  {}\n", state.status);
    let updated = state
        .last_updated
        .map(|at| format_local(at, offset))
        .unwrap_or_else(|| "never".to_string());
    output.push_str(&format!("Updated: {}\n\n", updated));

    for (metric, status) in thresholds.evaluate_all(&state.values) {
        output.push_str(&format!(
            "{:<16} {:>10}  {:<10} optimal {}\n",
            metric.label(),
            format_value_with_unit(metric, state.values.get(metric)),
            format_threshold(status, opts.no_color),
            format_range(thresholds, metric),
        ));
    }
    output
}

#[derive(Serialize)]
struct ReadingJson<'a> {
    status: String,
    last_updated: Option<String>,
    values: &'a smartfarm_types::SensorValues,
    thresholds: ThresholdsJson,
}

#[derive(Serialize)]
struct ThresholdsJson {
    temperature: ThresholdStatus,
    humidity: ThresholdStatus,
    soil_moisture: ThresholdStatus,
    light_intensity: ThresholdStatus,
}

/// Format the latest reading as JSON.
pub fn format_reading_json(
    state: &LiveState,
    thresholds: &Thresholds,
    opts: &FormatOptions,
) -> Result<String> {
    let values = &state.values;
    let reading = ReadingJson {
        status: state.status.to_string(),
        last_updated: state.last_updated.map(rfc3339),
        values,
        thresholds: ThresholdsJson {
            temperature: thresholds.evaluate(Metric::Temperature, values.temperature),
            humidity: thresholds.evaluate(Metric::Humidity, values.humidity),
            soil_moisture: thresholds.evaluate(Metric::SoilMoisture, values.soil_moisture),
            light_intensity: thresholds.evaluate(Metric::LightIntensity, values.light_intensity),
        },
    };
    opts.as_json(&reading)
}

const CSV_HEADER: &str = "timestamp,temperature,humidity,soil_moisture,light_intensity\n";

/// Format the latest reading as a single CSV row.
#[must_use]
pub fn format_reading_csv(state: &LiveState, opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        CSV_HEADER.to_string()
    };
    let timestamp = state.last_updated.map(rfc3339).unwrap_or_default();
    output.push_str(&csv_escape(&timestamp));
    for metric in Metric::ALL {
        output.push(',');
        output.push_str(&csv_value(metric, state.values.get(metric)));
    }
    output.push('\n');
    output
}

// ============================================================================
// History
// ============================================================================

/// Format one summary line, `None` meaning the metric had no values.
fn format_summary_line(metric: Metric, summary: Option<&MetricSummary>) -> String {
    match summary {
        Some(s) => format!(
            "{:<16} min {:>8}  max {:>8}  mean {:>8}  ({} samples)\n",
            metric.label(),
            format!("{:.*}", metric.decimals(), s.min),
            format!("{:.*}", metric.decimals(), s.max),
            format!("{:.*}", metric.decimals(), s.mean),
            s.count
        ),
        None => format!("{:<16} no data\n", metric.label()),
    }
}

/// Format a historical window as a table followed by per-metric summaries.
#[must_use]
pub fn format_history_text(series: &HistoricalSeries, offset: UtcOffset) -> String {
    if series.is_empty() {
        return format!("No readings in the last {}.\n", series.range());
    }

    let mut output = format!(
        "History {} ({} readings):\n\n",
        series.range(),
        series.len()
    );
    output.push_str(&format!(
        "{:<19}  {:>9}  {:>12}  {:>8}  {:>11}\n",
        "Time", "Temp (°C)", "Humidity (%)", "Soil (%)", "Light (lux)"
    ));
    for reading in series.readings() {
        let values = &reading.values;
        output.push_str(&format!(
            "{:<19}  {:>9}  {:>12}  {:>8}  {:>11}\n",
            format_local(reading.timestamp, offset),
            format_value(Metric::Temperature, values.temperature),
            format_value(Metric::Humidity, values.humidity),
            format_value(Metric::SoilMoisture, values.soil_moisture),
            format_value(Metric::LightIntensity, values.light_intensity),
        ));
    }

    output.push_str("\nSummary:\n");
    for metric in Metric::ALL {
        output.push_str(&format_summary_line(metric, summarize(series, metric).as_ref()));
    }
    output
}

/// Format a historical window as CSV. Missing values are empty cells.
#[must_use]
pub fn format_history_csv(series: &HistoricalSeries, opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        CSV_HEADER.to_string()
    };
    for reading in series.readings() {
        output.push_str(&csv_escape(&rfc3339(reading.timestamp)));
        for metric in Metric::ALL {
            output.push(',');
            output.push_str(&csv_value(metric, reading.values.get(metric)));
        }
        output.push('\n');
    }
    output
}

#[derive(Serialize)]
struct HistoryJson<'a> {
    #[serde(flatten)]
    series: &'a HistoricalSeries,
    count: usize,
    summary: Vec<MetricSummary>,
}

/// Format a historical window as JSON, with summaries of the raw values.
pub fn format_history_json(series: &HistoricalSeries, opts: &FormatOptions) -> Result<String> {
    let history = HistoryJson {
        series,
        count: series.len(),
        summary: Metric::ALL
            .iter()
            .filter_map(|metric| summarize(series, *metric))
            .collect(),
    };
    opts.as_json(&history)
}
