//! Error types for Negotiator API operations.
//!
//! Errors are categorized so the retry layer can tell transient failures
//! (gateway hiccups, rate limiting, dropped connections) from failures that
//! will never succeed on a second attempt.

use std::fmt;
use std::time::Duration;

/// Result type alias for Negotiator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// HTTP statuses that are retried by the transport layer.
pub const RETRYABLE_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Categories of Negotiator errors for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Network-related errors (transient, retryable).
    Network,
    /// Token acquisition failed.
    Auth,
    /// The API answered with a non-success status that will not change on retry.
    Rejected,
    /// Response body could not be decoded.
    Format,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Network => "Network connectivity issue",
            Self::Auth => "Authentication failed",
            Self::Rejected => "Request rejected by the Negotiator",
            Self::Format => "Unexpected response format",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Network => "Check connectivity to the Negotiator and try again",
            Self::Auth => "Verify client_id, client_secret, resource and token_url",
            Self::Rejected => "Inspect the response body for the reason",
            Self::Format => "Check that api_url points at the Negotiator v3 API",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while talking to the Negotiator.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        /// HTTP method of the failed request.
        method: &'static str,
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, kept for the diagnostic.
        body: String,
        /// Delay requested by the server's `Retry-After` header.
        retry_after: Option<Duration>,
    },

    /// The request never produced a response.
    #[error("request to {url} failed: {message}")]
    Transport {
        /// Request URL.
        url: String,
        /// Error message from the HTTP client.
        message: String,
    },

    /// No usable access token could be obtained.
    #[error("could not obtain access token: {0}")]
    Auth(String),

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl Error {
    /// Create a transport error for a request URL.
    pub fn transport(url: impl Into<String>, err: &ureq::Error) -> Self {
        Self::Transport {
            url: url.into(),
            message: err.to_string(),
        }
    }

    /// Get the category of this error.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Status { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                ErrorCategory::Network
            }
            Error::Status { .. } => ErrorCategory::Rejected,
            Error::Transport { .. } => ErrorCategory::Network,
            Error::Auth(_) => ErrorCategory::Auth,
            Error::InvalidResponse(_) => ErrorCategory::Format,
        }
    }

    /// Whether this error is transient and worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Network
    }

    /// HTTP status of the failed request, if the server answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Delay the server asked for before the next attempt, if any.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}
