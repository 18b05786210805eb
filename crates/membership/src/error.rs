//! Error types for membership reconciliation.

/// Result type alias for reconciliation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a reconciliation run.
///
/// A desired resource without a Negotiator counterpart is not an error; it is
/// collected in [`crate::SyncContext`] instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A Negotiator request failed after exhausting retries.
    #[error(transparent)]
    Api(#[from] negotiator::Error),

    /// A listing returned a page number behind the one requested.
    #[error("pagination of {path} did not advance: requested page {requested}, got page {returned}")]
    Pagination {
        /// Listing path.
        path: String,
        /// Page number requested.
        requested: u32,
        /// Page number the server answered with.
        returned: u32,
    },

    /// The input document could not be decoded.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_is_transparent() {
        let err: Error = negotiator::Error::Auth("no token".to_string()).into();
        assert_eq!(err.to_string(), "could not obtain access token: no token");
    }

    #[test]
    fn test_pagination_display() {
        let err = Error::Pagination {
            path: "/users".to_string(),
            requested: 2,
            returned: 0,
        };
        let display = err.to_string();
        assert!(display.contains("/users"));
        assert!(display.contains("requested page 2"));
    }
}
