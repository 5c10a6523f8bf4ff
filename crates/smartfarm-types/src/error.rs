//! Error types for data parsing in smartfarm-types.

use thiserror::Error;

/// Errors that can occur when parsing Smart Farm data.
///
/// This error type is transport-agnostic and does not include
/// subscription or HTTP errors (those belong in smartfarm-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Generic malformed input.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Time range text did not match any of the fixed windows.
    #[error("Unknown time range '{0}' (expected one of 1h, 6h, 24h, 7d, 30d)")]
    UnknownTimeRange(String),

    /// A record timestamp was not valid RFC 3339.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp {
        /// The raw timestamp text.
        value: String,
        /// Why parsing failed.
        reason: String,
    },
}

/// Result type alias using smartfarm-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
