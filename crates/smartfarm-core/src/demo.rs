//! Simulated data source for running without a database.
//!
//! Readings are drawn uniformly from fixed bands and pushed on an interval.
//! Records are produced in the gateway's wire shape, so everything
//! downstream of [`RealtimeSource`] runs exactly as it does against the real
//! database.

use std::ops::Range;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use rand::Rng;
use serde_json::{Value, json};
use time::OffsetDateTime;

use smartfarm_types::{Metric, parse_timestamp};

use crate::error::Result;
use crate::history::format_instant;
use crate::record::Snapshot;
use crate::source::{DevicePath, RealtimeSource, RecordQuery, SnapshotStream};

/// Default interval between simulated pushes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(2);

/// Band each metric is drawn from.
fn band(metric: Metric) -> Range<f64> {
    match metric {
        Metric::Temperature => 20.0..30.0,
        Metric::Humidity => 50.0..80.0,
        Metric::SoilMoisture => 30.0..70.0,
        Metric::LightIntensity => 20.0..40.0,
    }
}

/// A [`RealtimeSource`] that invents its data.
#[derive(Debug, Clone)]
pub struct DemoSource {
    interval: Duration,
}

impl Default for DemoSource {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl DemoSource {
    /// Create a source pushing a new reading every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// The push interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// One simulated record received at `at`.
    ///
    /// Fields are one-decimal strings, as the gateway sends them.
    pub fn record_at(at: OffsetDateTime) -> Result<Value> {
        let mut rng = rand::rng();
        let mut payload = serde_json::Map::new();
        for metric in Metric::ALL {
            let value = rng.random_range(band(metric));
            payload.insert(metric.payload_key().to_string(), json!(format!("{value:.1}")));
        }
        Ok(json!({
            "received_at": format_instant(at)?,
            "uplink_message": { "decoded_payload": payload }
        }))
    }

    fn latest_snapshot() -> Result<Snapshot> {
        let record = Self::record_at(OffsetDateTime::now_utc())?;
        Ok(Snapshot::from_children([("demo-latest".to_string(), record)]))
    }

    /// Records spaced evenly from `start` to `now`, at most `limit` of them.
    fn window(start: OffsetDateTime, now: OffsetDateTime, limit: usize) -> Result<Snapshot> {
        if limit == 0 || start > now {
            return Ok(Snapshot::empty());
        }
        let step = (now - start) / limit as u32;
        let mut children = Vec::with_capacity(limit);
        for i in 0..limit {
            // Newest first, mirroring an unordered source.
            let at = now - step * i as u32;
            children.push((format!("demo-{i:04}"), Self::record_at(at)?));
        }
        Ok(Snapshot::from_children(children))
    }
}

#[async_trait]
impl RealtimeSource for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn query(&self, _path: &DevicePath, query: &RecordQuery) -> Result<Snapshot> {
        let now = OffsetDateTime::now_utc();
        let limit = query.limit_to_last.unwrap_or(1);
        match query.start_at.as_deref() {
            Some(start) => Self::window(parse_timestamp(start)?, now, limit),
            None if limit == 0 => Ok(Snapshot::empty()),
            None => Self::latest_snapshot(),
        }
    }

    async fn listen(&self, _path: &DevicePath, _query: &RecordQuery) -> Result<SnapshotStream> {
        let interval = self.interval;
        Ok(Box::pin(stream::unfold(true, move |first| async move {
            if !first {
                tokio::time::sleep(interval).await;
            }
            Some((Self::latest_snapshot(), false))
        })))
    }
}
