//! Live subscription to the latest reading.
//!
//! [`subscribe_latest`] opens a live query for the single most recent record
//! and turns every push into a [`LiveEvent`]. Events are delivered to a sink
//! callback from a background task, in arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use smartfarm_types::{LiveEvent, LiveStatus, SensorValues};

use crate::error::{Error, Result};
use crate::record::{Snapshot, decode_values, received_at};
use crate::source::{DevicePath, RealtimeSource, RecordQuery};

/// Interpret one pushed snapshot of the latest-record query.
///
/// - no record: `NoData`, every value missing
/// - record without decoded payload: `Ready`, every value missing
/// - otherwise: `Ready` with the decoded values and the record's timestamp
pub fn interpret_latest(snapshot: &Snapshot) -> LiveEvent {
    let Some(record) = snapshot.latest() else {
        return LiveEvent::Update {
            values: SensorValues::missing(),
            status: LiveStatus::NoData,
            received_at: None,
        };
    };

    let values = decode_values(record).unwrap_or_else(|| {
        warn!("Latest record has no decoded payload");
        SensorValues::missing()
    });

    LiveEvent::Update {
        values,
        status: LiveStatus::Ready,
        received_at: received_at(record),
    }
}

/// Handle to an open live subscription.
///
/// Releasing is exactly-once: [`unsubscribe`](Self::unsubscribe) may be
/// called any number of times, and dropping the handle releases it too.
#[derive(Debug)]
pub struct Subscription {
    cancel_token: CancellationToken,
    handle: JoinHandle<()>,
    released: AtomicBool,
    path: DevicePath,
}

impl Subscription {
    /// Release the subscription.
    ///
    /// Returns `true` if this call released it, `false` if it was already
    /// released. No events are delivered after the first release returns.
    pub fn unsubscribe(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.cancel_token.cancel();
        info!(path = %self.path, "Unsubscribed from live updates");
        true
    }

    /// Whether the subscription has been released.
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Whether the background task is still running.
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Subscribe to the latest reading at `path`.
///
/// Each push is passed to `sink` as a [`LiveEvent::Update`]; runtime failures
/// of the channel arrive as [`LiveEvent::Failed`] and leave the subscription
/// in place. Fails with [`Error::SubscriptionInit`] if the channel cannot be
/// opened, in which case no handle exists.
///
/// Must be called from within a tokio runtime.
pub async fn subscribe_latest<F>(
    source: Arc<dyn RealtimeSource>,
    path: DevicePath,
    mut sink: F,
) -> Result<Subscription>
where
    F: FnMut(LiveEvent) + Send + 'static,
{
    let mut stream = source
        .listen(&path, &RecordQuery::latest())
        .await
        .map_err(|e| match e {
            Error::SubscriptionInit(_) => e,
            other => Error::SubscriptionInit(other.to_string()),
        })?;

    info!(source = source.name(), path = %path, "Subscribed to live updates");

    let cancel_token = CancellationToken::new();
    let task_token = cancel_token.clone();
    let task_path = path.clone();

    let handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!(path = %task_path, "Live subscription cancelled");
                    break;
                }
                item = stream.next() => {
                    let event = match item {
                        Some(Ok(snapshot)) => interpret_latest(&snapshot),
                        Some(Err(e)) => {
                            error!(path = %task_path, error = %e, "Live update failed");
                            LiveEvent::Failed(e.to_string())
                        }
                        None => {
                            debug!(path = %task_path, "Live stream ended");
                            break;
                        }
                    };
                    if task_token.is_cancelled() {
                        break;
                    }
                    sink(event);
                }
            }
        }
    });

    Ok(Subscription {
        cancel_token,
        handle,
        released: AtomicBool::new(false),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use smartfarm_types::SensorValue;
    use time::macros::datetime;

    #[test]
    fn test_no_record_is_no_data() {
        let event = interpret_latest(&Snapshot::empty());
        assert_eq!(
            event,
            LiveEvent::Update {
                values: SensorValues::missing(),
                status: LiveStatus::NoData,
                received_at: None,
            }
        );
    }

    #[test]
    fn test_record_without_payload_is_ready_and_missing() {
        let snapshot = Snapshot::from_children([(
            "k".to_string(),
            json!({ "received_at": "2024-01-01T00:00:00Z", "uplink_message": {} }),
        )]);
        let LiveEvent::Update { values, status, received_at } = interpret_latest(&snapshot) else {
            panic!("expected update");
        };
        assert_eq!(values, SensorValues::missing());
        assert_eq!(status, LiveStatus::Ready);
        assert_eq!(received_at, Some(datetime!(2024-01-01 00:00:00 UTC)));
    }

    #[test]
    fn test_record_with_payload() {
        let snapshot = Snapshot::from_children([(
            "k".to_string(),
            json!({
                "received_at": "2024-01-01T00:00:00Z",
                "uplink_message": { "decoded_payload": { "temperature": "21.3" } }
            }),
        )]);
        let LiveEvent::Update { values, status, .. } = interpret_latest(&snapshot) else {
            panic!("expected update");
        };
        assert_eq!(status, LiveStatus::Ready);
        assert_eq!(values.temperature, SensorValue::Numeric(21.3));
        assert_eq!(values.humidity, SensorValue::Missing);
    }

    #[test]
    fn test_bad_timestamp_keeps_values() {
        let snapshot = Snapshot::from_children([(
            "k".to_string(),
            json!({
                "received_at": "yesterday",
                "uplink_message": { "decoded_payload": { "humidity": 50 } }
            }),
        )]);
        let LiveEvent::Update { values, received_at, .. } = interpret_latest(&snapshot) else {
            panic!("expected update");
        };
        assert_eq!(values.humidity, SensorValue::Numeric(50.0));
        assert_eq!(received_at, None);
    }
}
