//! Trait abstraction for the remote real-time data source.
//!
//! The dashboard talks to a path-addressed, order-by-field store that can
//! push changes. [`RealtimeSource`] is the seam between the data-access layer
//! and a concrete store, so the client is constructed once at startup and
//! injected rather than created lazily as a process-wide singleton.
//!
//! Implementations:
//!
//! - [`crate::firebase::FirebaseClient`] (feature `firebase`)
//! - [`crate::mock::MockSource`] for tests
//! - [`crate::demo::DemoSource`] for running without a database

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use futures::stream::Stream;

use crate::error::Result;
use crate::record::{RECEIVED_AT, Snapshot};

/// A stream of snapshots pushed by a live query.
///
/// An `Err` item reports a runtime failure of the channel; the stream may
/// continue or end afterwards.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Snapshot>> + Send>>;

/// Logical path of the single monitored device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DevicePath(String);

impl DevicePath {
    /// Path used by the field deployment.
    pub const DEFAULT: &'static str = "devices/smart-farm-gp5/smartfarm-node-1";

    /// Create a path, trimming surrounding slashes.
    pub fn new(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().trim_matches('/').to_string())
    }

    /// The path without leading or trailing slashes.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DevicePath {
    fn default() -> Self {
        Self::new(Self::DEFAULT)
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query shape supported by the store: order by a child field, optionally
/// starting at a value, optionally keeping only the last N entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    /// Child field to order by.
    pub order_by: String,
    /// Inclusive lower bound on the ordered field.
    pub start_at: Option<String>,
    /// Keep only this many entries from the end of the ordering.
    pub limit_to_last: Option<usize>,
}

impl RecordQuery {
    /// The most recent record by `received_at`.
    pub fn latest() -> Self {
        Self {
            order_by: RECEIVED_AT.to_string(),
            start_at: None,
            limit_to_last: Some(1),
        }
    }

    /// Records with `received_at >= start`, capped to the `limit` most recent.
    pub fn since(start: impl Into<String>, limit: usize) -> Self {
        Self {
            order_by: RECEIVED_AT.to_string(),
            start_at: Some(start.into()),
            limit_to_last: Some(limit),
        }
    }
}

/// A remote store that can answer one-shot queries and push live updates.
#[async_trait]
pub trait RealtimeSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run a one-shot query.
    async fn query(&self, path: &DevicePath, query: &RecordQuery) -> Result<Snapshot>;

    /// Open a live query.
    ///
    /// An `Err` here means the channel could not be opened at all. Once
    /// open, the stream yields the current snapshot and then one snapshot per
    /// change.
    async fn listen(&self, path: &DevicePath, query: &RecordQuery) -> Result<SnapshotStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_path_trims_slashes() {
        let path = DevicePath::new("/devices/a/b/");
        assert_eq!(path.as_str(), "devices/a/b");
        assert_eq!(path.to_string(), "devices/a/b");
    }

    #[test]
    fn test_default_device_path() {
        assert_eq!(DevicePath::default().as_str(), DevicePath::DEFAULT);
    }

    #[test]
    fn test_latest_query_shape() {
        let q = RecordQuery::latest();
        assert_eq!(q.order_by, "received_at");
        assert_eq!(q.start_at, None);
        assert_eq!(q.limit_to_last, Some(1));
    }

    #[test]
    fn test_since_query_shape() {
        let q = RecordQuery::since("2024-01-01T00:00:00.000Z", 288);
        assert_eq!(q.start_at.as_deref(), Some("2024-01-01T00:00:00.000Z"));
        assert_eq!(q.limit_to_last, Some(288));
    }
}
