//! Optimal ranges and Good/Warning classification.
//!
//! Each metric has an inclusive optimal range. A current value inside it is
//! [`ThresholdStatus::Good`]; anything else, including a missing or
//! still-loading value, is [`ThresholdStatus::Warning`].
//!
//! # Example
//!
//! ```
//! use smartfarm_core::{ThresholdStatus, Thresholds};
//! use smartfarm_types::{Metric, SensorValue};
//!
//! let thresholds = Thresholds::default();
//! assert_eq!(
//!     thresholds.evaluate(Metric::Temperature, SensorValue::Numeric(23.5)),
//!     ThresholdStatus::Good
//! );
//! assert_eq!(
//!     thresholds.evaluate(Metric::Temperature, SensorValue::Missing),
//!     ThresholdStatus::Warning
//! );
//! ```

use serde::{Deserialize, Serialize};

use smartfarm_types::{Metric, SensorValue, SensorValues};

/// Classification of a current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdStatus {
    /// Inside the optimal range.
    Good,
    /// Outside the range, or no value.
    Warning,
}

impl ThresholdStatus {
    /// Short label for status cards.
    pub fn label(&self) -> &'static str {
        match self {
            ThresholdStatus::Good => "Good",
            ThresholdStatus::Warning => "Warning",
        }
    }
}

/// Inclusive `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl OptimalRange {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies within the range, bounds included.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Optimal range per metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Temperature in °C.
    pub temperature: OptimalRange,
    /// Relative humidity in %.
    pub humidity: OptimalRange,
    /// Volumetric soil moisture.
    pub soil_moisture: OptimalRange,
    /// Light in lux.
    pub light_intensity: OptimalRange,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            temperature: OptimalRange::new(18.0, 24.0),
            humidity: OptimalRange::new(40.0, 60.0),
            soil_moisture: OptimalRange::new(3.0, 10.0),
            light_intensity: OptimalRange::new(200.0, 800.0),
        }
    }
}

impl ThresholdConfig {
    /// The range for `metric`.
    pub fn range(&self, metric: Metric) -> OptimalRange {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::LightIntensity => self.light_intensity,
        }
    }
}

/// Threshold evaluator for current values.
#[derive(Debug, Clone, Default)]
pub struct Thresholds {
    config: ThresholdConfig,
}

impl Thresholds {
    /// Create an evaluator with the given ranges.
    pub fn new(config: ThresholdConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ThresholdConfig {
        &self.config
    }

    /// Classify one value.
    pub fn evaluate(&self, metric: Metric, value: SensorValue) -> ThresholdStatus {
        match value.numeric() {
            Some(v) if self.config.range(metric).contains(v) => ThresholdStatus::Good,
            _ => ThresholdStatus::Warning,
        }
    }

    /// Classify all four current values, in [`Metric::ALL`] order.
    pub fn evaluate_all(&self, values: &SensorValues) -> [(Metric, ThresholdStatus); 4] {
        Metric::ALL.map(|metric| (metric, self.evaluate(metric, values.get(metric))))
    }
}
