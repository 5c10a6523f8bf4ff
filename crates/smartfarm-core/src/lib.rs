//! Data access and view composition for the Smart Farm sensor dashboard.
//!
//! This crate turns a remote real-time feed of device records into typed
//! dashboard state.
//!
//! # Features
//!
//! - **Live subscription**: latest reading plus channel status, pushed as it
//!   changes ([`subscribe_latest`])
//! - **Historical windows**: time-ranged queries returned as ordered series
//!   ([`fetch_historical`])
//! - **Pluggable sources**: the [`RealtimeSource`] trait with a Firebase
//!   client, an in-memory mock and a simulated demo feed
//! - **Thresholds**: Good/Warning status against configurable optimal ranges
//! - **Analytics**: chart series, distribution shares, averages and raw
//!   summaries
//! - **State container**: [`Dashboard`] with discrete transitions, change
//!   observers and stale-response protection
//!
//! # Record format
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `received_at` | RFC 3339 instant the gateway received the uplink |
//! | `uplink_message.decoded_payload.temperature` | °C, number or numeric string |
//! | `uplink_message.decoded_payload.humidity` | %, number or numeric string |
//! | `uplink_message.decoded_payload.soil_moisture` | number or numeric string |
//! | `uplink_message.decoded_payload.light_intensity` | lux, number or numeric string |
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use smartfarm_core::firebase::FirebaseClient;
//! use smartfarm_core::{DevicePath, RealtimeSource, fetch_historical, subscribe_latest};
//! use smartfarm_types::TimeRange;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source: Arc<dyn RealtimeSource> = Arc::new(FirebaseClient::new(
//!         "https://example-default-rtdb.firebaseio.com",
//!         Duration::from_secs(10),
//!     )?);
//!     let path = DevicePath::default();
//!
//!     let series = fetch_historical(source.as_ref(), &path, TimeRange::Day).await?;
//!     println!("{} readings in the last 24h", series.len());
//!
//!     let subscription = subscribe_latest(source, path, |event| {
//!         println!("{event:?}");
//!     })
//!     .await?;
//!
//!     tokio::time::sleep(Duration::from_secs(30)).await;
//!     subscription.unsubscribe();
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod dashboard;
pub mod demo;
pub mod error;
#[cfg(feature = "firebase")]
pub mod firebase;
pub mod history;
pub mod live;
pub mod messages;
pub mod mock;
pub mod record;
pub mod source;
pub mod thresholds;

pub use smartfarm_types as types;

pub use analytics::{
    Averages, ChartPoint, Distribution, MetricSummary, averages, chart_series, distribution,
    summarize,
};
pub use dashboard::{Dashboard, DashboardState, HistoryRequest, Tab};
pub use demo::DemoSource;
pub use error::{Error, Result};
#[cfg(feature = "firebase")]
pub use firebase::FirebaseClient;
pub use history::{fetch_historical, fetch_historical_at, fetch_historical_cancellable};
pub use live::{Subscription, interpret_latest, subscribe_latest};
pub use messages::{Command, DashboardEvent};
pub use mock::MockSource;
pub use record::Snapshot;
pub use source::{DevicePath, RealtimeSource, RecordQuery, SnapshotStream};
pub use thresholds::{OptimalRange, ThresholdConfig, ThresholdStatus, Thresholds};
