//! Error types for linkward.

use linkward_fetch::FetchError;
use thiserror::Error;

/// Errors that abort a validation run or reject a configuration.
///
/// Broken links are not errors: they are reported as
/// [`ValidationResult`](crate::ValidationResult)s in a
/// [`ValidationErrorStream`](crate::ValidationErrorStream).
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Cannot end parentless group")]
    ParentlessGroup,

    #[error("Provide a GitHub token to access https://api.github.com/repos/OWNER/REPO/contents/PATH")]
    MissingToken,

    #[error("Bad fragment in {uri}: {source}")]
    Selector {
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("Environment variable {0} is not set")]
    MissingEnv(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Config(#[from] figment::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Links that remained broken, rendered as a report.
    #[error("Broken links:{0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, Error>;
