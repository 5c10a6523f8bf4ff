//! Background worker for data source operations.
//!
//! [`DashboardWorker`] owns the data source and the live subscription so
//! that network calls never block the rendering loop. It talks to the UI
//! loop over channels:
//!
//! - Receives [`Command`]s from the UI to perform operations
//! - Sends [`DashboardEvent`]s back with live pushes and fetch results
//!
//! Opening the live subscription and each historical fetch run as separate
//! tasks, so neither a slow window nor a stalled live channel delays any
//! other request. History results carry the generation they were requested
//! with and live events carry the subscription session; the UI loop discards
//! stale ones.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use smartfarm_core::{
    Command, DashboardEvent, DevicePath, Error, HistoryRequest, RealtimeSource, Subscription,
    fetch_historical_cancellable, subscribe_latest,
};

/// Default bound on opening the live subscription.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of a subscription attempt, reported back to the worker loop.
struct Opened {
    session: u64,
    result: smartfarm_core::Result<Subscription>,
}

/// Background worker that handles data source operations.
pub struct DashboardWorker {
    /// The data source, shared with in-flight tasks.
    source: Arc<dyn RealtimeSource>,
    /// Device whose records are read.
    path: DevicePath,
    /// Receiver for commands from the UI thread.
    command_rx: mpsc::Receiver<Command>,
    /// Sender for events back to the UI thread.
    event_tx: mpsc::UnboundedSender<DashboardEvent>,
    /// Subscription attempts report here.
    opened_tx: mpsc::UnboundedSender<Opened>,
    opened_rx: mpsc::UnboundedReceiver<Opened>,
    /// The open live subscription, if any.
    subscription: Option<Subscription>,
    /// Session of the current (or pending) subscription.
    session: u64,
    /// A subscription attempt for `session` is in flight.
    opening: bool,
    /// Bound on opening the live subscription.
    open_timeout: Duration,
    /// Cancels in-flight tasks of the current session on reload and shutdown.
    cancel_token: CancellationToken,
}

impl DashboardWorker {
    /// Create a new worker.
    ///
    /// # Arguments
    ///
    /// * `source` - Data source for the whole session
    /// * `path` - Device to read from
    /// * `command_rx` - Channel receiver for commands from the UI
    /// * `event_tx` - Channel sender for events to the UI
    pub fn new(
        source: Arc<dyn RealtimeSource>,
        path: DevicePath,
        command_rx: mpsc::Receiver<Command>,
        event_tx: mpsc::UnboundedSender<DashboardEvent>,
    ) -> Self {
        let (opened_tx, opened_rx) = mpsc::unbounded_channel();
        Self {
            source,
            path,
            command_rx,
            event_tx,
            opened_tx,
            opened_rx,
            subscription: None,
            session: 0,
            opening: false,
            open_timeout: DEFAULT_OPEN_TIMEOUT,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Bound the time allowed for opening the live subscription.
    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Run the worker's main loop.
    ///
    /// Consumes the worker and runs until a [`Command::Shutdown`] is
    /// received or the command channel is closed. The live subscription is
    /// released on the way out.
    pub async fn run(mut self) {
        info!(source = self.source.name(), "DashboardWorker started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(Command::Shutdown) => {
                            info!("DashboardWorker received shutdown command");
                            break;
                        }
                        Some(cmd) => self.handle_command(cmd),
                        None => {
                            info!("Command channel closed, shutting down worker");
                            break;
                        }
                    }
                }
                Some(opened) = self.opened_rx.recv() => self.handle_opened(opened),
            }
        }

        self.cancel_token.cancel();
        self.release_subscription();
        info!("DashboardWorker stopped");
    }

    /// Handle a single command from the UI.
    fn handle_command(&mut self, cmd: Command) {
        debug!(?cmd, "Handling command");

        match cmd {
            Command::Subscribe { session } => {
                if session != self.session {
                    debug!(session, current = self.session, "Ignoring subscribe for old session");
                    return;
                }
                if self.opening {
                    debug!("Live subscription already opening");
                    return;
                }
                if self.subscription.as_ref().is_some_and(Subscription::is_active) {
                    debug!("Live subscription already open");
                    return;
                }
                self.spawn_subscribe();
            }
            Command::Resubscribe { session } => {
                // Tasks of the old session are stale now.
                self.cancel_token.cancel();
                self.cancel_token = CancellationToken::new();
                self.release_subscription();
                self.session = session;
                self.spawn_subscribe();
            }
            Command::FetchHistory(request) => self.spawn_fetch(request),
            Command::Shutdown => {}
        }
    }

    fn release_subscription(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }

    /// Open the live subscription in its own task, forwarding every event to
    /// the UI stamped with the current session.
    fn spawn_subscribe(&mut self) {
        self.opening = true;

        let source = Arc::clone(&self.source);
        let path = self.path.clone();
        let session = self.session;
        let event_tx = self.event_tx.clone();
        let opened_tx = self.opened_tx.clone();
        let cancel_token = self.cancel_token.clone();
        let open_timeout = self.open_timeout;

        tokio::spawn(async move {
            let open = subscribe_latest(source, path, move |event| {
                let _ = event_tx.send(DashboardEvent::Live { session, event });
            });
            let result = tokio::select! {
                _ = cancel_token.cancelled() => Err(Error::Cancelled),
                opened = tokio::time::timeout(open_timeout, open) => match opened {
                    Ok(result) => result,
                    Err(_) => Err(Error::SubscriptionInit(format!(
                        "no response within {}s",
                        open_timeout.as_secs()
                    ))),
                },
            };
            let _ = opened_tx.send(Opened { session, result });
        });
    }

    /// Store a freshly opened subscription, or report why it failed.
    fn handle_opened(&mut self, opened: Opened) {
        let Opened { session, result } = opened;
        if session != self.session {
            // Dropping a late handle releases it.
            debug!(session, current = self.session, "Discarding subscription of old session");
            return;
        }
        self.opening = false;

        match result {
            Ok(subscription) => self.subscription = Some(subscription),
            Err(Error::Cancelled) => debug!(session, "Subscription attempt cancelled"),
            Err(e) => {
                error!(path = %self.path, error = %e, "Failed to open live subscription");
                let _ = self.event_tx.send(DashboardEvent::SubscriptionFailed {
                    session,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Fetch a historical window in its own task.
    fn spawn_fetch(&self, request: HistoryRequest) {
        let source = Arc::clone(&self.source);
        let path = self.path.clone();
        let event_tx = self.event_tx.clone();
        let cancel_token = self.cancel_token.clone();

        tokio::spawn(async move {
            let HistoryRequest { range, generation } = request;
            let result =
                fetch_historical_cancellable(source.as_ref(), &path, range, &cancel_token).await;

            let result = match result {
                Err(Error::Cancelled) => return,
                Err(e) => {
                    warn!(range = %range, error = %e, "Historical fetch failed");
                    Err(e.to_string())
                }
                Ok(series) => Ok(series),
            };
            let _ = event_tx.send(DashboardEvent::History {
                generation,
                range,
                result,
            });
        });
    }
}
