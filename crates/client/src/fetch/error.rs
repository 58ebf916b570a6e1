//! Transport error types.

use pantry_core::Error;

/// Failures below the HTTP layer. Upstream status codes are never errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Connection refused, DNS failure, TLS failure and the like.
    #[error("network unreachable: {0}")]
    Unreachable(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// The body could not be read to the end.
    #[error("body read failed: {0}")]
    Body(String),

    /// Body exceeded the configured limit.
    #[error("{len} bytes exceeds {limit}")]
    TooLarge { len: u64, limit: usize },

    /// The request could not be built (bad method or header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::TooLarge { .. } => Error::FetchTooLarge(err.to_string()),
            other => Error::TransportFailure(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransportError::TooLarge { len: 10, limit: 5 };
        assert_eq!(err.to_string(), "10 bytes exceeds 5");

        let err = TransportError::Unreachable("connection refused".into());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_into_core_error() {
        let err: Error = TransportError::Timeout.into();
        assert!(matches!(err, Error::TransportFailure(_)));

        let err: Error = TransportError::TooLarge { len: 10, limit: 5 }.into();
        assert!(matches!(err, Error::FetchTooLarge(_)));
    }
}
