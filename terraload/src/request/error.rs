//! Transport error types.

use thiserror::Error;

/// Result of a request's transport future.
pub type FetchResult = Result<bytes::Bytes, FetchError>;

/// Errors a request function can settle with.
///
/// Cancellation is not an error: a cancelled request reports
/// [`RequestStatus::Cancelled`](super::RequestStatus::Cancelled) instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The server answered with a non-success status code.
    #[error("HTTP status {status}")]
    Http { status: u16 },

    /// Connection, TLS or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The transport task was aborted before it produced a response.
    #[error("Request aborted")]
    Aborted,

    /// The response arrived but its body could not be read.
    #[error("Failed to read response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Creates a transport error from any displayable error.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::Http {
                status: status.as_u16(),
            };
        }
        if err.is_body() || err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        assert_eq!(FetchError::Http { status: 404 }.to_string(), "HTTP status 404");
        assert_eq!(
            FetchError::Transport("connection reset".to_string()).to_string(),
            "Transport error: connection reset"
        );
        assert_eq!(FetchError::Aborted.to_string(), "Request aborted");
    }

    #[test]
    fn test_transport_helper() {
        let err = FetchError::transport(std::io::Error::other("boom"));
        assert_eq!(err, FetchError::Transport("boom".to_string()));
    }
}
