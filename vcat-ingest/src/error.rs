//! Ingestion error taxonomy
//!
//! Every failure in the pipeline is classified into exactly one of the
//! four kinds below before it crosses a component boundary. Retry
//! eligibility is decided here and nowhere else.

use thiserror::Error;

/// Ingestion pipeline errors
#[derive(Debug, Error)]
pub enum IngestError {
    /// Transport failure or HTTP response with status >= 400
    #[error("Network error: {message}")]
    Network {
        message: String,
        status: Option<u16>,
        retryable: bool,
    },

    /// Malformed or empty XML input; never retryable
    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    /// Structurally valid record with a semantically invalid field; never retryable
    #[error("Transformation error: {0}")]
    Transformation(String),

    /// Persistence-layer failure
    #[error("Datastore error: {message}")]
    Datastore { message: String, retryable: bool },
}

impl IngestError {
    /// Single source of truth for retry eligibility.
    ///
    /// Network and datastore errors carry their own verdict, decided at
    /// classification time. Parsing and transformation errors describe
    /// defective input, which a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            IngestError::Network { retryable, .. } => *retryable,
            IngestError::Datastore { retryable, .. } => *retryable,
            IngestError::XmlParsing(_) | IngestError::Transformation(_) => false,
        }
    }

    pub fn network(message: impl Into<String>, status: Option<u16>, retryable: bool) -> Self {
        IngestError::Network {
            message: message.into(),
            status,
            retryable,
        }
    }

    pub fn datastore(message: impl Into<String>, retryable: bool) -> Self {
        IngestError::Datastore {
            message: message.into(),
            retryable,
        }
    }
}

/// HTTP statuses worth retrying: rate limiting and upstream gateway trouble
pub fn retryable_status(status: u16) -> bool {
    matches!(status, 429 | 502 | 503 | 504)
}

/// Classify a transport-level `reqwest` failure.
///
/// Timeouts and connect failures (refused, host not found) may succeed
/// on a later attempt, as may a connection dropped mid-request; anything
/// else only retries when the carried HTTP status says so.
pub fn retryable_transport(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    // A reset after a successful connect is not flagged as a connect
    // error; it only surfaces as an io error down the source chain.
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return retryable_io(io);
        }
        source = cause.source();
    }
    match err.status() {
        Some(status) => retryable_status(status.as_u16()),
        None => false,
    }
}

/// I/O failures that indicate a dropped or stalled connection
pub fn retryable_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::TimedOut
    )
}

/// Infer datastore retryability from the driver's error text.
///
/// This is a heuristic against the message, not a contract: the driver
/// does not expose a structured "transient" flag, and the substrings
/// below track the connection/timeout wording it uses today.
pub fn datastore_retryable(message: &str) -> bool {
    message.contains("connection") || message.contains("timeout") || message.contains("ECONNREFUSED")
}
