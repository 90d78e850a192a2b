//! Error types for linkward-fetch.

use thiserror::Error;

/// Transport-level failures of a single fetch.
///
/// HTTP error statuses are not errors here: a `404` or `503` comes back as a
/// [`Response`](crate::Response) so the caller can classify it.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unable to connect: {0}")]
    ConnectionRefused(String),

    #[error("Unknown host {0}")]
    UnknownHost(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("{0}")]
    Network(String),

    #[error("Bad selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_messages() {
        assert_eq!(
            FetchError::ConnectionRefused("localhost:1".to_string()).to_string(),
            "Unable to connect: localhost:1"
        );
        assert_eq!(
            FetchError::UnknownHost("nowhere.invalid".to_string()).to_string(),
            "Unknown host nowhere.invalid"
        );
    }
}
