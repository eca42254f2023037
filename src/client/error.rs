//! Client error taxonomy.

use std::time::Duration;

use thiserror::Error;

use crate::context::Done;

/// Failure of the underlying transport: no response object was produced.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The transport's own timeout fired.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The request context was cancelled before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The request context's deadline passed before a response arrived.
    #[error("context deadline exceeded")]
    DeadlineExceeded,

    /// The request could not be handed to the transport.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// Failure reported by a non-reqwest transport.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        match self {
            TransportError::Timeout(_) | TransportError::DeadlineExceeded => true,
            TransportError::Http(e) => e.is_timeout(),
            _ => false,
        }
    }
}

impl From<Done> for TransportError {
    fn from(done: Done) -> Self {
        match done {
            Done::Cancelled => TransportError::Cancelled,
            Done::DeadlineExceeded => TransportError::DeadlineExceeded,
        }
    }
}

/// Errors returned by [`InstrumentedClient`](crate::client::InstrumentedClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// A required input was missing; nothing was sent.
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    /// The transport returned no response.
    #[error("http call returned no response: {0}")]
    Transport(#[source] TransportError),

    /// The response declared gzip but could not be decompressed.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] std::io::Error),

    /// Reading the request or response body failed.
    #[error("failed to read body: {0}")]
    Io(#[source] axum::Error),

    /// The client could not be constructed.
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Short classification used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Precondition(_) => "precondition",
            ClientError::Transport(_) => "transport",
            ClientError::Decode(_) => "decode",
            ClientError::Io(_) => "io",
            ClientError::Config(_) => "config",
        }
    }
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::Precondition("context is nil");
        assert_eq!(err.to_string(), "precondition failed: context is nil");

        let err = ClientError::Transport(TransportError::Timeout(Duration::from_secs(5)));
        assert_eq!(err.to_string(), "http call returned no response: request timed out after 5s");
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn done_maps_to_transport_error() {
        assert!(matches!(TransportError::from(Done::Cancelled), TransportError::Cancelled));
        let err = TransportError::from(Done::DeadlineExceeded);
        assert!(err.is_timeout());
    }
}
