//! In-memory data source for testing.
//!
//! [`MockSource`] implements [`RealtimeSource`] over a list of records held in
//! memory. Pushing a record notifies every open live query, so tests can drive
//! the live path exactly like the gateway would.
//!
//! # Features
//!
//! - **Query semantics**: `orderBy` / `startAt` / `limitToLast` are applied
//!   the way the real database applies them
//! - **Failure injection**: fail opening live queries, fail one-shot queries,
//!   or push a runtime error into open live queries
//! - **Latency simulation**: delay one-shot queries or the opening of live
//!   queries
//! - **Call counting**: observe how many one-shot queries were made

use std::sync::{Arc, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{Error, Result};
use crate::record::Snapshot;
use crate::source::{DevicePath, RealtimeSource, RecordQuery, SnapshotStream};

/// Last change announced to live queries.
#[derive(Debug, Clone)]
enum Feed {
    Records,
    Failure(String),
}

/// An in-memory [`RealtimeSource`].
///
/// The device path is ignored; every path sees the same records.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use smartfarm_core::{DevicePath, MockSource, RealtimeSource, RecordQuery};
///
/// #[tokio::main]
/// async fn main() {
///     let source = MockSource::new();
///     source.push(json!({ "received_at": "2024-01-01T00:00:00Z" }));
///
///     let snapshot = source
///         .query(&DevicePath::default(), &RecordQuery::latest())
///         .await
///         .unwrap();
///     assert_eq!(snapshot.len(), 1);
/// }
/// ```
pub struct MockSource {
    records: Arc<Mutex<Vec<(String, Value)>>>,
    feed: watch::Sender<Feed>,
    fail_listen: Mutex<Option<String>>,
    fail_query: Mutex<Option<String>>,
    query_count: AtomicU32,
    /// Simulated query latency in milliseconds (0 = no delay).
    query_latency_ms: AtomicU64,
    /// Simulated live-query open latency in milliseconds (0 = no delay).
    listen_latency_ms: AtomicU64,
}

impl std::fmt::Debug for MockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSource")
            .field("records", &self.records().len())
            .field("query_count", &self.query_count())
            .finish()
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

impl MockSource {
    /// Create an empty source.
    pub fn new() -> Self {
        let (feed, _) = watch::channel(Feed::Records);
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            feed,
            fail_listen: Mutex::new(None),
            fail_query: Mutex::new(None),
            query_count: AtomicU32::new(0),
            query_latency_ms: AtomicU64::new(0),
            listen_latency_ms: AtomicU64::new(0),
        }
    }

    /// Create a source preloaded with records.
    pub fn with_records(records: impl IntoIterator<Item = Value>) -> Self {
        let source = Self::new();
        for record in records {
            source.insert(record);
        }
        source
    }

    async fn simulate_latency(latency_ms: &AtomicU64) {
        let latency = latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    fn insert(&self, record: Value) {
        let mut records = lock(&self.records);
        let key = format!("-M{:08}", records.len());
        records.push((key, record));
    }

    /// Append a record and notify live queries.
    pub fn push(&self, record: Value) {
        self.insert(record);
        self.feed.send_replace(Feed::Records);
    }

    /// Push a runtime failure into every open live query.
    pub fn push_error(&self, message: &str) {
        self.feed.send_replace(Feed::Failure(message.to_string()));
    }

    /// Make [`RealtimeSource::listen`] fail with the given message.
    pub fn set_fail_listen(&self, message: Option<&str>) {
        *lock(&self.fail_listen) = message.map(str::to_string);
    }

    /// Make [`RealtimeSource::query`] fail with the given message.
    pub fn set_fail_query(&self, message: Option<&str>) {
        *lock(&self.fail_query) = message.map(str::to_string);
    }

    /// Delay every [`RealtimeSource::query`] by `latency`.
    pub fn set_query_latency(&self, latency: Duration) {
        self.query_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Delay opening every live query by `latency`.
    pub fn set_listen_latency(&self, latency: Duration) {
        self.listen_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Number of one-shot queries made so far.
    pub fn query_count(&self) -> u32 {
        self.query_count.load(Ordering::Relaxed)
    }

    /// All stored records in insertion order.
    pub fn records(&self) -> Vec<(String, Value)> {
        lock(&self.records).clone()
    }
}

/// Apply a query to stored records.
///
/// Records are ranked by the string value of the ordered field (records
/// without it rank first), `startAt` drops records below the bound, and
/// `limitToLast` keeps the tail of the ranking. The result keeps insertion
/// order, since the database gives no ordering guarantee.
fn evaluate(records: &[(String, Value)], query: &RecordQuery) -> Snapshot {
    let field = |record: &Value| {
        record
            .get(&query.order_by)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    let mut ranked: Vec<(Option<String>, usize)> = records
        .iter()
        .enumerate()
        .map(|(i, (_, record))| (field(record), i))
        .filter(|(value, _)| match &query.start_at {
            Some(start) => value.as_deref().is_some_and(|v| v >= start.as_str()),
            None => true,
        })
        .collect();
    ranked.sort();

    if let Some(limit) = query.limit_to_last {
        let skip = ranked.len().saturating_sub(limit);
        ranked.drain(..skip);
    }

    let mut selected: Vec<usize> = ranked.into_iter().map(|(_, i)| i).collect();
    selected.sort_unstable();
    Snapshot::from_children(selected.into_iter().map(|i| records[i].clone()))
}

struct ListenState {
    initial: Option<Snapshot>,
    receiver: watch::Receiver<Feed>,
    records: Arc<Mutex<Vec<(String, Value)>>>,
    query: RecordQuery,
}

#[async_trait]
impl RealtimeSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, _path: &DevicePath, query: &RecordQuery) -> Result<Snapshot> {
        self.query_count.fetch_add(1, Ordering::Relaxed);
        Self::simulate_latency(&self.query_latency_ms).await;
        if let Some(message) = lock(&self.fail_query).clone() {
            return Err(Error::Transport(message));
        }
        Ok(evaluate(&lock(&self.records), query))
    }

    async fn listen(&self, _path: &DevicePath, query: &RecordQuery) -> Result<SnapshotStream> {
        Self::simulate_latency(&self.listen_latency_ms).await;
        if let Some(message) = lock(&self.fail_listen).clone() {
            return Err(Error::SubscriptionInit(message));
        }

        let state = ListenState {
            initial: Some(evaluate(&lock(&self.records), query)),
            receiver: self.feed.subscribe(),
            records: Arc::clone(&self.records),
            query: query.clone(),
        };

        Ok(Box::pin(stream::unfold(state, |mut state| async move {
            if let Some(initial) = state.initial.take() {
                return Some((Ok(initial), state));
            }
            // Ends when the source is dropped.
            state.receiver.changed().await.ok()?;
            let feed = state.receiver.borrow_and_update().clone();
            let item = match feed {
                Feed::Records => Ok(evaluate(&lock(&state.records), &state.query)),
                Feed::Failure(message) => Err(Error::Subscription(message)),
            };
            Some((item, state))
        })))
    }
}
