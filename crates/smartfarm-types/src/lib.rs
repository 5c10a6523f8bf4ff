//! Platform-agnostic types for Smart Farm sensor readings.
//!
//! This crate provides the data model shared by the data-access layer
//! (smartfarm-core) and the dashboard front end (smartfarm-cli).
//!
//! # Features
//!
//! - [`SensorValue`]: numeric / missing / loading tagged value
//! - [`Reading`] and [`HistoricalSeries`] for time series
//! - [`LiveState`] with its wholesale transition [`LiveState::apply`]
//! - [`TimeRange`] with the fixed duration / sample-cap pairs
//!
//! # Example
//!
//! ```
//! use smartfarm_types::{Metric, SensorValue, SensorValues, TimeRange};
//!
//! let values = SensorValues::missing().with(Metric::Temperature, 21.3);
//! assert_eq!(values.temperature, SensorValue::Numeric(21.3));
//! assert!(values.humidity.is_missing());
//! assert_eq!(TimeRange::Day.sample_limit(), 288);
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    HistoricalSeries, LiveEvent, LiveState, LiveStatus, Metric, Reading, SensorValue,
    SensorValues, TimeRange, parse_timestamp,
};
