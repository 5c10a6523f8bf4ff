//! Chart-ready series and aggregates derived from dashboard state.
//!
//! Two kinds of aggregate live here and must not be confused:
//!
//! - chart derivations ([`chart_series`], [`averages`], [`distribution`])
//!   plot missing values as `0`, so a gap pulls the line and the mean down
//! - [`summarize`] works on raw readings and excludes missing values

use serde::Serialize;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use smartfarm_types::{HistoricalSeries, Metric, SensorValues, TimeRange};

/// Divisor applied to light so it shares an axis with the percentages.
pub const LIGHT_SCALE: f64 = 100.0;

const SHORT_LABEL: &[FormatItem<'static>] = format_description!("[hour]:[minute]");
const LONG_LABEL: &[FormatItem<'static>] =
    format_description!("[month]/[day] [hour]:[minute]");

/// One plotted sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Sample instant.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Axis label in local time.
    pub label: String,
    /// Temperature, 0 when missing.
    pub temperature: f64,
    /// Humidity, 0 when missing.
    pub humidity: f64,
    /// Soil moisture, 0 when missing.
    pub soil_moisture: f64,
    /// Light intensity, 0 when missing.
    pub light_intensity: f64,
}

impl ChartPoint {
    /// The plotted value of `metric`.
    pub fn value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::LightIntensity => self.light_intensity,
        }
    }
}

/// Axis label for `timestamp` in the given local offset.
///
/// Windows up to a day show `HH:MM`; longer windows add the date.
pub fn chart_label(timestamp: OffsetDateTime, range: TimeRange, offset: UtcOffset) -> String {
    let local = timestamp.to_offset(offset);
    let format = if range.spans_days() {
        LONG_LABEL
    } else {
        SHORT_LABEL
    };
    local.format(format).unwrap_or_default()
}

/// Convert a series to plot points, oldest first.
pub fn chart_series(series: &HistoricalSeries, offset: UtcOffset) -> Vec<ChartPoint> {
    series
        .readings()
        .iter()
        .map(|reading| ChartPoint {
            timestamp: reading.timestamp,
            label: chart_label(reading.timestamp, series.range(), offset),
            temperature: reading.values.temperature.or_zero(),
            humidity: reading.values.humidity.or_zero(),
            soil_moisture: reading.values.soil_moisture.or_zero(),
            light_intensity: reading.values.light_intensity.or_zero(),
        })
        .collect()
}

/// Shares of the current reading, with light scaled down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Distribution {
    /// Current temperature.
    pub temperature: f64,
    /// Current humidity.
    pub humidity: f64,
    /// Current soil moisture.
    pub soil_moisture: f64,
    /// Current light divided by [`LIGHT_SCALE`].
    pub light: f64,
}

impl Distribution {
    /// `(label, value)` pairs for a bar chart.
    pub fn bars(&self) -> [(&'static str, f64); 4] {
        [
            ("Temperature", self.temperature),
            ("Humidity", self.humidity),
            ("Soil Moisture", self.soil_moisture),
            ("Light (/100)", self.light),
        ]
    }
}

/// Distribution of the current live values. Missing values count as 0.
pub fn distribution(values: &SensorValues) -> Distribution {
    Distribution {
        temperature: values.temperature.or_zero(),
        humidity: values.humidity.or_zero(),
        soil_moisture: values.soil_moisture.or_zero(),
        light: values.light_intensity.or_zero() / LIGHT_SCALE,
    }
}

/// Mean of each metric over the plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Averages {
    /// Mean temperature.
    pub temperature: f64,
    /// Mean humidity.
    pub humidity: f64,
    /// Mean soil moisture.
    pub soil_moisture: f64,
    /// Mean light divided by [`LIGHT_SCALE`].
    pub light: f64,
}

impl Averages {
    /// `(label, value)` pairs for a bar chart.
    pub fn bars(&self) -> [(&'static str, f64); 4] {
        [
            ("Temperature", self.temperature),
            ("Humidity", self.humidity),
            ("Soil Moisture", self.soil_moisture),
            ("Light (/100)", self.light),
        ]
    }
}

/// Averages over plot points. An empty series averages to 0 everywhere.
pub fn averages(points: &[ChartPoint]) -> Averages {
    if points.is_empty() {
        return Averages::default();
    }
    let n = points.len() as f64;
    let mean = |metric: Metric| points.iter().map(|p| p.value(metric)).sum::<f64>() / n;
    Averages {
        temperature: mean(Metric::Temperature),
        humidity: mean(Metric::Humidity),
        soil_moisture: mean(Metric::SoilMoisture),
        light: mean(Metric::LightIntensity) / LIGHT_SCALE,
    }
}

/// Statistics of the raw readings of one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSummary {
    /// Metric summarized.
    pub metric: Metric,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Mean value.
    pub mean: f64,
    /// Readings that carried a value.
    pub count: usize,
}

/// Summarize one metric, ignoring missing values.
///
/// Returns `None` when no reading carries a value.
pub fn summarize(series: &HistoricalSeries, metric: Metric) -> Option<MetricSummary> {
    let values: Vec<f64> = series
        .readings()
        .iter()
        .filter_map(|r| r.values.get(metric).numeric())
        .collect();
    if values.is_empty() {
        return None;
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(MetricSummary {
        metric,
        min,
        max,
        mean,
        count: values.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartfarm_types::{Reading, SensorValue};
    use time::macros::{datetime, offset};

    fn reading(ts: OffsetDateTime, t: f64, h: f64, s: f64, l: f64) -> Reading {
        Reading::new(
            ts,
            SensorValues {
                temperature: t.into(),
                humidity: h.into(),
                soil_moisture: s.into(),
                light_intensity: l.into(),
            },
        )
    }

    #[test]
    fn test_labels_by_range() {
        let ts = datetime!(2024-03-05 14:07:00 UTC);
        assert_eq!(chart_label(ts, TimeRange::Day, UtcOffset::UTC), "14:07");
        assert_eq!(chart_label(ts, TimeRange::OneHour, offset!(+2)), "16:07");
        assert_eq!(chart_label(ts, TimeRange::Week, UtcOffset::UTC), "03/05 14:07");
    }

    #[test]
    fn test_chart_series_zeroes_missing() {
        let ts = datetime!(2024-01-01 00:00:00 UTC);
        let series = HistoricalSeries::new(
            TimeRange::Day,
            vec![Reading::new(
                ts,
                SensorValues::missing().with(Metric::Temperature, 21.0),
            )],
        );
        let points = chart_series(&series, UtcOffset::UTC);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].temperature, 21.0);
        assert_eq!(points[0].humidity, 0.0);
        assert_eq!(points[0].label, "00:00");
    }

    #[test]
    fn test_empty_averages_are_zero() {
        assert_eq!(averages(&[]), Averages::default());
        let a = averages(&[]);
        assert_eq!(
            (a.temperature, a.humidity, a.soil_moisture, a.light),
            (0.0, 0.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_averages_scale_light_and_count_missing_as_zero() {
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        let series = HistoricalSeries::new(
            TimeRange::Day,
            vec![
                reading(t0, 20.0, 50.0, 5.0, 400.0),
                Reading::new(t0 + time::Duration::hours(1), SensorValues::missing()),
            ],
        );
        let a = averages(&chart_series(&series, UtcOffset::UTC));
        assert_eq!(a.temperature, 10.0);
        assert_eq!(a.humidity, 25.0);
        assert_eq!(a.soil_moisture, 2.5);
        assert_eq!(a.light, 2.0);
    }

    #[test]
    fn test_distribution() {
        let values = SensorValues {
            temperature: 21.3.into(),
            humidity: 55.0.into(),
            soil_moisture: SensorValue::Missing,
            light_intensity: 410.0.into(),
        };
        let d = distribution(&values);
        assert_eq!(d.temperature, 21.3);
        assert_eq!(d.soil_moisture, 0.0);
        assert_eq!(d.light, 4.1);
        assert_eq!(d.bars()[3].0, "Light (/100)");
    }

    #[test]
    fn test_summary_excludes_missing() {
        let t0 = datetime!(2024-01-01 00:00:00 UTC);
        let series = HistoricalSeries::new(
            TimeRange::Day,
            vec![
                reading(t0, 18.0, 40.0, 3.0, 100.0),
                Reading::new(t0 + time::Duration::minutes(5), SensorValues::missing()),
                reading(t0 + time::Duration::minutes(10), 22.0, 60.0, 5.0, 300.0),
            ],
        );
        let s = summarize(&series, Metric::Temperature).unwrap();
        assert_eq!((s.min, s.max, s.mean, s.count), (18.0, 22.0, 20.0, 2));
        assert!(summarize(&HistoricalSeries::empty(TimeRange::Day), Metric::Humidity).is_none());
    }
}
