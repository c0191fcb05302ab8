use thiserror::Error;

/// Opaque failure reason bubbled up from a [`Transport`](crate::transport::Transport).
///
/// The core never interprets the reason; it is carried verbatim so callers
/// and log output see whatever the connection layer reported (reset, protocol
/// error, handshake failure, and so on).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct TransportError {
    reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Every way a dispatched request can fail.
///
/// The first two variants are detected before any I/O occurs. A request
/// either fully succeeds with a [`Response`](crate::http::Response) or fails
/// with exactly one of these; there is no partial result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The target URL could not be parsed at all.
    #[error("bad url: {0}")]
    BadUrl(String),
    /// The URL parsed but its scheme is absent or not http/https.
    #[error("bad url scheme: {0}")]
    BadUrlScheme(String),
    /// The registry failed to construct a pool for a reason other than
    /// "already exists" (which is success).
    #[error("pool creation failed: {0}")]
    PoolCreation(String),
    /// Checkout waited the full checkout timeout without obtaining a worker.
    /// Backpressure signal; callers should back off or retry.
    #[error("timed out waiting for a pool worker")]
    PoolTimeout,
    /// The connection layer failed; reason preserved uninterpreted.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Execution exceeded the request timeout after a worker was obtained.
    #[error("request exceeded its execution timeout")]
    RequestTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_reason_is_preserved_verbatim() {
        let err = Error::from(TransportError::new("connection reset by peer"));
        match &err {
            Error::Transport(t) => assert_eq!(t.reason(), "connection reset by peer"),
            other => panic!("expected Transport, got {other:?}"),
        }
        assert_eq!(err.to_string(), "transport error: connection reset by peer");
    }

    #[test]
    fn io_error_converts_to_transport_reason() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let t = TransportError::from(io);
        assert!(t.reason().contains("refused"));
    }
}
