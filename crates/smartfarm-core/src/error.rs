//! Error types for smartfarm-core.
//!
//! # Propagation policy
//!
//! Only failures of the live channel are user-visible:
//!
//! | Error | Surface |
//! |-------|---------|
//! | [`Error::SubscriptionInit`] | Full-dashboard error view with Retry |
//! | [`Error::Subscription`] | Status `Error(message)`, last good values kept |
//! | [`Error::HistoricalFetch`] | Logged; the previous series stays on screen |
//!
//! Nothing here is retried automatically. Recovery is either the source
//! pushing again or the user reloading the dashboard.

use thiserror::Error;

use smartfarm_types::{ParseError, TimeRange};

/// Errors that can occur while talking to the remote data source.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The live channel could not be opened at all.
    #[error("Failed to initialize subscription: {0}")]
    SubscriptionInit(String),

    /// The live channel was open but a push failed.
    #[error("Failed to fetch data: {0}")]
    Subscription(String),

    /// A historical query failed.
    #[error("Failed to fetch historical data for {range}: {message}")]
    HistoricalFetch {
        /// The window that was requested.
        range: TimeRange,
        /// Description of the failure.
        message: String,
    },

    /// HTTP or stream level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A snapshot or record could not be decoded.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidRecord(err.to_string())
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::InvalidRecord(err.to_string())
    }
}

#[cfg(feature = "firebase")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl Error {
    /// Wrap a transport failure of a historical query.
    pub fn historical(range: TimeRange, err: impl std::fmt::Display) -> Self {
        Error::HistoricalFetch {
            range,
            message: err.to_string(),
        }
    }
}

/// Result type alias using smartfarm-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
