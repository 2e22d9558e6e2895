//! Error types for powertracker-core.
//!
//! Every failure aborts the run: nothing here is retried internally. The
//! variants fall into four groups.
//!
//! | Group | Variants | Caller action |
//! |-------|----------|---------------|
//! | Configuration | [`Error::InvalidConfig`], [`Error::InvalidUrl`] | Fix settings, no I/O was attempted |
//! | Connection | [`Error::Dial`], [`Error::Timeout`], [`Error::AuthenticationFailed`], [`Error::ConnectionClosed`], [`Error::Transport`] | Check server reachability and token |
//! | Protocol | [`Error::Protocol`], [`Error::Decode`], [`Error::UnexpectedMessage`], [`Error::IdMismatch`] | Server speaks an unexpected dialect |
//! | Upstream | [`Error::Upstream`], [`Error::NoStatistics`], [`Error::InsufficientBuckets`] | Server answered, but not with usable data |

use std::time::Duration;

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur while talking to the Home Assistant websocket API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Required setting missing or unusable.
    #[error("{0}")]
    InvalidConfig(String),

    /// The base URL could not be parsed.
    #[error("parse \"{url}\": {source}")]
    InvalidUrl {
        /// The URL as supplied.
        url: String,
        #[source]
        source: UrlError,
    },

    /// The websocket upgrade failed.
    #[error("dial {url}: {source}")]
    Dial {
        /// The websocket URL that was dialled.
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// The server rejected the access token.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The server closed the connection.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// Websocket transport error after the connection was established.
    #[error("websocket: {0}")]
    Transport(#[from] Box<tungstenite::Error>),

    /// A frame arrived that is not part of the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A text frame could not be decoded into a known message.
    #[error("decoding message: {0}")]
    Decode(#[from] serde_json::Error),

    /// A valid message arrived at the wrong point of the exchange.
    #[error("expected {expected} message, got {actual}")]
    UnexpectedMessage {
        /// The message type the exchange was waiting for.
        expected: &'static str,
        /// The message type that arrived.
        actual: String,
    },

    /// The response does not answer the request that was sent.
    #[error("response id {actual} does not match request id {expected}")]
    IdMismatch {
        /// The id of the outstanding request.
        expected: u64,
        /// The id carried by the response.
        actual: u64,
    },

    /// The server reported `success: false`.
    #[error("api response error: {code}: {message}")]
    Upstream {
        /// Server error code.
        code: String,
        /// Server error message.
        message: String,
    },

    /// The server returned no buckets for the sensor.
    #[error("no results returned - is your sensor id '{sensor_id}' correct?")]
    NoStatistics {
        /// The sensor that was queried.
        sensor_id: String,
    },

    /// Fewer hourly buckets than a full day.
    #[error("sensor '{sensor_id}' returned {actual} hourly buckets, expected at least {expected}")]
    InsufficientBuckets {
        /// The sensor that was queried.
        sensor_id: String,
        /// Buckets required for one day.
        expected: usize,
        /// Buckets received.
        actual: usize,
    },
}

/// Why a base URL was rejected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UrlError {
    /// A `%` not followed by two hex digits, or an escape in the host.
    #[error("invalid URL escape \"{0}\"")]
    InvalidEscape(String),

    /// Rejected by the URL parser.
    #[error(transparent)]
    Syntax(#[from] url::ParseError),
}

impl Error {
    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Whether the error was raised before any network I/O took place.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::InvalidConfig(_) | Self::InvalidUrl { .. })
    }
}

impl From<tungstenite::Error> for Error {
    fn from(err: tungstenite::Error) -> Self {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                Self::ConnectionClosed
            }
            other => Self::Transport(Box::new(other)),
        }
    }
}

/// Result type alias using powertracker-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
