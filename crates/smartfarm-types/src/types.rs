//! Core types for Smart Farm sensor data.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

use crate::error::{ParseError, ParseResult};

/// One of the four environmental metrics reported by the field node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Metric {
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Relative humidity percentage.
    Humidity,
    /// Volumetric soil moisture.
    SoilMoisture,
    /// Ambient light in lux.
    LightIntensity,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::LightIntensity,
    ];

    /// Human-readable name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::SoilMoisture => "Soil Moisture",
            Metric::LightIntensity => "Light Intensity",
        }
    }

    /// Abbreviated name for chart legends and narrow columns.
    #[must_use]
    pub fn short_label(self) -> &'static str {
        match self {
            Metric::Temperature => "Temp",
            Metric::Humidity => "Hum",
            Metric::SoilMoisture => "Soil",
            Metric::LightIntensity => "Light",
        }
    }

    /// Display unit.
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity | Metric::SoilMoisture => "%",
            Metric::LightIntensity => "lux",
        }
    }

    /// Key of this metric inside the uplink `decoded_payload` object.
    #[must_use]
    pub fn payload_key(self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::SoilMoisture => "soil_moisture",
            Metric::LightIntensity => "light_intensity",
        }
    }

    /// Number of decimal places the metric is rounded to and displayed with.
    #[must_use]
    pub fn decimals(self) -> usize {
        match self {
            Metric::LightIntensity => 0,
            _ => 1,
        }
    }

    /// Round a raw value to this metric's precision.
    ///
    /// ```
    /// use smartfarm_types::Metric;
    ///
    /// assert_eq!(Metric::Temperature.round(21.349), 21.3);
    /// assert_eq!(Metric::LightIntensity.round(409.6), 410.0);
    /// ```
    #[must_use]
    pub fn round(self, value: f64) -> f64 {
        match self.decimals() {
            0 => value.round(),
            _ => (value * 10.0).round() / 10.0,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single metric value as carried through the model.
///
/// Missing and loading states are explicit variants so that nothing
/// downstream can mistake them for a numeric zero. Display text is produced
/// only when rendering.
///
/// Serialized as a bare number, or `null` for the non-numeric variants.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum SensorValue {
    /// A decoded numeric value, already rounded to the metric's precision.
    Numeric(f64),
    /// The field exists in the schema but the source did not provide it.
    #[default]
    Missing,
    /// No update has arrived yet.
    Loading,
}

impl SensorValue {
    /// The numeric value, if any.
    #[must_use]
    pub fn numeric(self) -> Option<f64> {
        match self {
            SensorValue::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Whether the value is the missing marker.
    #[must_use]
    pub fn is_missing(self) -> bool {
        matches!(self, SensorValue::Missing)
    }

    /// Numeric value with every non-numeric state plotted as zero.
    ///
    /// Only chart derivations should use this.
    #[must_use]
    pub fn or_zero(self) -> f64 {
        self.numeric().unwrap_or(0.0)
    }
}

impl From<f64> for SensorValue {
    fn from(value: f64) -> Self {
        SensorValue::Numeric(value)
    }
}

/// The four metric values of one sample, without a timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorValues {
    /// Air temperature in °C.
    pub temperature: SensorValue,
    /// Relative humidity in %.
    pub humidity: SensorValue,
    /// Soil moisture.
    pub soil_moisture: SensorValue,
    /// Light intensity in lux.
    pub light_intensity: SensorValue,
}

impl SensorValues {
    /// Every field set to the same value.
    #[must_use]
    pub fn uniform(value: SensorValue) -> Self {
        Self {
            temperature: value,
            humidity: value,
            soil_moisture: value,
            light_intensity: value,
        }
    }

    /// Every field missing.
    #[must_use]
    pub fn missing() -> Self {
        Self::uniform(SensorValue::Missing)
    }

    /// Every field still loading.
    #[must_use]
    pub fn loading() -> Self {
        Self::uniform(SensorValue::Loading)
    }

    /// Value of one metric.
    #[must_use]
    pub fn get(&self, metric: Metric) -> SensorValue {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::LightIntensity => self.light_intensity,
        }
    }

    /// Copy with one metric replaced.
    #[must_use]
    pub fn with(mut self, metric: Metric, value: impl Into<SensorValue>) -> Self {
        let value = value.into();
        match metric {
            Metric::Temperature => self.temperature = value,
            Metric::Humidity => self.humidity = value,
            Metric::SoilMoisture => self.soil_moisture = value,
            Metric::LightIntensity => self.light_intensity = value,
        }
        self
    }

    /// Iterate `(metric, value)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Metric, SensorValue)> + '_ {
        Metric::ALL.into_iter().map(|m| (m, self.get(m)))
    }
}

/// One timestamped sample. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// When the gateway received the uplink.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// The sample's metric values.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub values: SensorValues,
}

impl Reading {
    /// Create a reading.
    #[must_use]
    pub fn new(timestamp: OffsetDateTime, values: SensorValues) -> Self {
        Self { timestamp, values }
    }
}

/// Parse an RFC 3339 timestamp such as `2024-01-01T00:00:00Z`.
pub fn parse_timestamp(value: &str) -> ParseResult<OffsetDateTime> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| ParseError::InvalidTimestamp {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Health of the live channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LiveStatus {
    /// Subscription opened, nothing received yet.
    #[default]
    Connecting,
    /// The channel delivered a record.
    Ready,
    /// The channel is live but has no record at the device path.
    NoData,
    /// The channel failed.
    Error(String),
}

impl LiveStatus {
    /// Whether this is the error state.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, LiveStatus::Error(_))
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiveStatus::Connecting => write!(f, "Connecting"),
            LiveStatus::Ready => write!(f, "Live"),
            LiveStatus::NoData => write!(f, "No data"),
            LiveStatus::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// One notification from the live channel.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A push was decoded. `status` is `Ready` or `NoData`.
    Update {
        /// Decoded values (all missing for `NoData` or an incomplete record).
        values: SensorValues,
        /// Channel status implied by the push.
        status: LiveStatus,
        /// The record's `received_at`, when present and parseable.
        received_at: Option<OffsetDateTime>,
    },
    /// The channel reported a failure.
    Failed(String),
}

/// Current view of the latest reading.
///
/// Replaced wholesale on every live event; see [`LiveState::apply`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LiveState {
    /// Latest values.
    pub values: SensorValues,
    /// Channel status.
    pub status: LiveStatus,
    /// `received_at` of the last decoded record.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub last_updated: Option<OffsetDateTime>,
}

impl Default for LiveState {
    fn default() -> Self {
        Self {
            values: SensorValues::loading(),
            status: LiveStatus::Connecting,
            last_updated: None,
        }
    }
}

impl LiveState {
    /// Compute the state that replaces `self` after `event`.
    ///
    /// A failure keeps the previous values; an update without a parseable
    /// timestamp keeps the previous `last_updated`.
    ///
    /// ```
    /// use smartfarm_types::{LiveEvent, LiveState, LiveStatus, SensorValues};
    ///
    /// let state = LiveState::default().apply(&LiveEvent::Update {
    ///     values: SensorValues::missing(),
    ///     status: LiveStatus::NoData,
    ///     received_at: None,
    /// });
    /// assert_eq!(state.status, LiveStatus::NoData);
    ///
    /// let failed = state.apply(&LiveEvent::Failed("offline".into()));
    /// assert_eq!(failed.values, state.values);
    /// assert!(failed.status.is_error());
    /// ```
    #[must_use]
    pub fn apply(&self, event: &LiveEvent) -> LiveState {
        match event {
            LiveEvent::Update {
                values,
                status,
                received_at,
            } => LiveState {
                values: *values,
                status: status.clone(),
                last_updated: received_at.or(self.last_updated),
            },
            LiveEvent::Failed(message) => LiveState {
                values: self.values,
                status: LiveStatus::Error(message.clone()),
                last_updated: self.last_updated,
            },
        }
    }
}

/// Historical window selectable in the dashboard.
///
/// Each window is a fixed pair of duration and sample cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TimeRange {
    /// Last hour, up to 60 samples.
    #[cfg_attr(feature = "serde", serde(rename = "1h"))]
    OneHour,
    /// Last 6 hours, up to 100 samples.
    #[cfg_attr(feature = "serde", serde(rename = "6h"))]
    SixHours,
    /// Last 24 hours, up to 288 samples (one per 5 minutes).
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "24h"))]
    Day,
    /// Last 7 days, up to 336 samples (one per 30 minutes).
    #[cfg_attr(feature = "serde", serde(rename = "7d"))]
    Week,
    /// Last 30 days, up to 720 samples (one per hour).
    #[cfg_attr(feature = "serde", serde(rename = "30d"))]
    Month,
}

impl TimeRange {
    /// All windows in selector order.
    pub const ALL: [TimeRange; 5] = [
        TimeRange::OneHour,
        TimeRange::SixHours,
        TimeRange::Day,
        TimeRange::Week,
        TimeRange::Month,
    ];

    /// Length of the window.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            TimeRange::OneHour => Duration::hours(1),
            TimeRange::SixHours => Duration::hours(6),
            TimeRange::Day => Duration::hours(24),
            TimeRange::Week => Duration::days(7),
            TimeRange::Month => Duration::days(30),
        }
    }

    /// Maximum number of most-recent samples fetched for the window.
    #[must_use]
    pub fn sample_limit(self) -> usize {
        match self {
            TimeRange::OneHour => 60,
            TimeRange::SixHours => 100,
            TimeRange::Day => 288,
            TimeRange::Week => 336,
            TimeRange::Month => 720,
        }
    }

    /// Short selector label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TimeRange::OneHour => "1h",
            TimeRange::SixHours => "6h",
            TimeRange::Day => "24h",
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
        }
    }

    /// Position in [`TimeRange::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            TimeRange::OneHour => 0,
            TimeRange::SixHours => 1,
            TimeRange::Day => 2,
            TimeRange::Week => 3,
            TimeRange::Month => 4,
        }
    }

    /// Whether the window spans more than a single day.
    #[must_use]
    pub fn spans_days(self) -> bool {
        matches!(self, TimeRange::Week | TimeRange::Month)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeRange {
    type Err = ParseError;

    /// Parse a selector label.
    ///
    /// ```
    /// use smartfarm_types::TimeRange;
    ///
    /// assert_eq!("7d".parse::<TimeRange>(), Ok(TimeRange::Week));
    /// assert!("2h".parse::<TimeRange>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(TimeRange::OneHour),
            "6h" => Ok(TimeRange::SixHours),
            "24h" | "1d" => Ok(TimeRange::Day),
            "7d" => Ok(TimeRange::Week),
            "30d" => Ok(TimeRange::Month),
            _ => Err(ParseError::UnknownTimeRange(s.to_string())),
        }
    }
}

/// Readings for one window, sorted non-decreasing by timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct HistoricalSeries {
    range: TimeRange,
    readings: Vec<Reading>,
}

impl HistoricalSeries {
    /// Build a series, sorting the readings chronologically.
    ///
    /// The sort is stable so readings with equal timestamps keep their
    /// relative order.
    #[must_use]
    pub fn new(range: TimeRange, mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        Self { range, readings }
    }

    /// An empty series for `range`.
    #[must_use]
    pub fn empty(range: TimeRange) -> Self {
        Self {
            range,
            readings: Vec::new(),
        }
    }

    /// The window this series was fetched for.
    #[must_use]
    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// The readings, oldest first.
    #[must_use]
    pub fn readings(&self) -> &[Reading] {
        &self.readings
    }

    /// Number of readings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the series holds no readings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// The newest reading.
    #[must_use]
    pub fn latest(&self) -> Option<&Reading> {
        self.readings.last()
    }
}
