//! Firebase Realtime Database client over REST and Server-Sent Events.
//!
//! One-shot queries use `GET {database}/{path}.json` with the `orderBy`,
//! `startAt` and `limitToLast` parameters. Live queries use the same URL with
//! `Accept: text/event-stream`; the server then sends `put` / `patch` events
//! as data changes, `keep-alive` heartbeats, and `cancel` / `auth_revoked`
//! when it stops serving the listener.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use smartfarm_core::firebase::FirebaseClient;
//! use smartfarm_core::{DevicePath, RealtimeSource, RecordQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FirebaseClient::new(
//!     "https://example-default-rtdb.firebaseio.com",
//!     Duration::from_secs(10),
//! )?;
//! let snapshot = client.query(&DevicePath::default(), &RecordQuery::latest()).await?;
//! println!("{} record(s)", snapshot.len());
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::Snapshot;
use crate::source::{DevicePath, RealtimeSource, RecordQuery, SnapshotStream};

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Longest silence tolerated on a live query. The server sends `keep-alive`
/// every 30 seconds.
pub const STREAM_READ_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for one Firebase Realtime Database.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    /// Client for one-shot queries, with a whole-request timeout.
    client: Client,
    /// Client for live queries; connect and each read are bounded, the
    /// whole response is not.
    stream_client: Client,
    database_url: String,
}

impl FirebaseClient {
    /// Create a client for the database at `database_url`.
    ///
    /// # Arguments
    ///
    /// * `database_url` - e.g. `https://my-project-default-rtdb.firebaseio.com`
    /// * `timeout` - bound for one-shot queries and for opening live queries
    pub fn new(database_url: &str, timeout: Duration) -> Result<Self> {
        let database_url = Self::normalize_url(database_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let stream_client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(STREAM_READ_TIMEOUT.max(timeout))
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            stream_client,
            database_url,
        })
    }

    fn normalize_url(database_url: &str) -> Result<String> {
        let url = database_url.trim().trim_end_matches('/').to_string();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(Error::InvalidConfig(format!(
                "database URL must start with http:// or https://, got: {}",
                database_url
            )));
        }
        Ok(url)
    }

    /// The database base URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    fn url(&self, path: &DevicePath) -> String {
        format!("{}/{}.json", self.database_url, path)
    }

    /// Query parameters for a [`RecordQuery`].
    ///
    /// `orderBy` and `startAt` are JSON-encoded, as the REST API requires.
    fn query_params(query: &RecordQuery) -> Vec<(&'static str, String)> {
        let quote = |s: &str| Value::String(s.to_string()).to_string();
        let mut params = vec![("orderBy", quote(&query.order_by))];
        if let Some(start) = &query.start_at {
            params.push(("startAt", quote(start)));
        }
        if let Some(limit) = query.limit_to_last {
            params.push(("limitToLast", limit.to_string()));
        }
        params
    }

    /// Turn a non-success response into a transport error.
    async fn check_status(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            error: String,
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(Error::Transport(format!("HTTP {}: {}", status.as_u16(), message)))
    }
}

#[async_trait]
impl RealtimeSource for FirebaseClient {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn query(&self, path: &DevicePath, query: &RecordQuery) -> Result<Snapshot> {
        let response = self
            .client
            .get(self.url(path))
            .query(&Self::query_params(query))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: Value = response.json().await?;
        let snapshot = Snapshot::from_json(body);
        debug!(path = %path, records = snapshot.len(), "Query completed");
        Ok(snapshot)
    }

    async fn listen(&self, path: &DevicePath, query: &RecordQuery) -> Result<SnapshotStream> {
        let response = self
            .stream_client
            .get(self.url(path))
            .query(&Self::query_params(query))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| Error::SubscriptionInit(e.to_string()))?;
        let response = Self::check_status(response)
            .await
            .map_err(|e| Error::SubscriptionInit(e.to_string()))?;

        info!(path = %path, "Live query opened");

        let listener = Listener {
            body: Box::pin(response.bytes_stream()),
            decoder: SseDecoder::default(),
            pending: VecDeque::new(),
            client: self.clone(),
            path: path.clone(),
            query: query.clone(),
            done: false,
        };

        Ok(Box::pin(stream::unfold(listener, |mut listener| async move {
            let item = listener.next_snapshot().await?;
            Some((item, listener))
        })))
    }
}

/// State of one open live query.
struct Listener {
    body: ByteStream,
    decoder: SseDecoder,
    pending: VecDeque<SseEvent>,
    client: FirebaseClient,
    path: DevicePath,
    query: RecordQuery,
    done: bool,
}

/// Payload of `put` and `patch` events.
#[derive(Debug, Deserialize)]
struct ChangeData {
    path: String,
    #[serde(default)]
    data: Value,
}

impl Listener {
    async fn next_snapshot(&mut self) -> Option<Result<Snapshot>> {
        loop {
            if self.done {
                return None;
            }

            while let Some(event) = self.pending.pop_front() {
                match event.name.as_str() {
                    "put" | "patch" => {
                        return Some(
                            snapshot_for(&self.client, &self.path, &self.query, &event).await,
                        );
                    }
                    "keep-alive" => {}
                    "cancel" | "auth_revoked" => {
                        self.done = true;
                        warn!(path = %self.path, event = %event.name, "Server closed live query");
                        return Some(Err(Error::Subscription(format!(
                            "listener closed by server ({})",
                            event.name
                        ))));
                    }
                    other => debug!(event = other, "Ignoring unknown stream event"),
                }
            }

            match self.body.next().await {
                Some(Ok(chunk)) => {
                    let events = self.decoder.feed(&chunk);
                    self.pending.extend(events);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(Error::Subscription(e.to_string())));
                }
                None => {
                    self.done = true;
                    return Some(Err(Error::Subscription(
                        "stream closed by server".to_string(),
                    )));
                }
            }
        }
    }
}

/// Resolve a change event into a full snapshot of the query.
///
/// A `put` at the root carries the complete result. Anything else is a
/// partial change, so the query is run again.
async fn snapshot_for(
    client: &FirebaseClient,
    path: &DevicePath,
    query: &RecordQuery,
    event: &SseEvent,
) -> Result<Snapshot> {
    let change: ChangeData = serde_json::from_str(&event.data)
        .map_err(|e| Error::Subscription(format!("malformed {} event: {}", event.name, e)))?;

    if event.name == "put" && change.path == "/" {
        return Ok(Snapshot::from_json(change.data));
    }

    debug!(path = %change.path, "Partial change, re-running query");
    client
        .query(path, query)
        .await
        .map_err(|e| Error::Subscription(e.to_string()))
}

/// One dispatched Server-Sent Event.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SseEvent {
    name: String,
    data: String,
}

/// Incremental `text/event-stream` decoder.
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; bytes are buffered
/// until a full line is available.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            if self.event.is_none() && self.data.is_empty() {
                return None;
            }
            return Some(SseEvent {
                name: self.event.take().unwrap_or_else(|| "message".to_string()),
                data: std::mem::take(&mut self.data).join("\n"),
            });
        }

        // Comment line
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}
