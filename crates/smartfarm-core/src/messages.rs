//! Message types for UI/worker communication.
//!
//! ```text
//! +------------------+     Command      +-------------------+
//! |     UI loop      | --------------> |  DashboardWorker  |
//! |  (owns state)    |                 |  (tokio runtime)  |
//! |                  | <-------------- |                   |
//! +------------------+  DashboardEvent +-------------------+
//! ```
//!
//! - [`Command`]: requests from the UI loop to the background worker
//! - [`DashboardEvent`]: results from the worker back to the UI loop
//!
//! The worker never touches dashboard state; the UI loop applies each event
//! through the matching [`crate::Dashboard`] transition.
//!
//! Live events carry the session of the subscription that produced them.
//! [`crate::Dashboard::reset`] starts a new session, so anything the released
//! subscription delivered before the worker caught up is discarded.

use smartfarm_types::{HistoricalSeries, LiveEvent, TimeRange};

use crate::dashboard::HistoryRequest;

/// Requests sent from the UI loop to the background worker.
#[derive(Debug, Clone)]
pub enum Command {
    /// Open the live subscription if it is not open or opening.
    Subscribe {
        /// Session to stamp live events with.
        session: u64,
    },

    /// Release any live subscription and open a new one (Retry).
    Resubscribe {
        /// The new session.
        session: u64,
    },

    /// Fetch a historical window.
    FetchHistory(HistoryRequest),

    /// Release the subscription and stop the worker.
    Shutdown,
}

/// Events sent from the background worker to the UI loop.
#[derive(Debug, Clone)]
pub enum DashboardEvent {
    /// The live subscription delivered an event.
    Live {
        /// Session of the subscription.
        session: u64,
        /// The event.
        event: LiveEvent,
    },

    /// The live subscription could not be opened.
    SubscriptionFailed {
        /// Session the subscription was opened for.
        session: u64,
        /// Description of the failure.
        message: String,
    },

    /// A historical fetch completed.
    History {
        /// Generation of the request this answers.
        generation: u64,
        /// Window that was fetched.
        range: TimeRange,
        /// The series, or a description of the failure.
        result: Result<HistoricalSeries, String>,
    },
}
