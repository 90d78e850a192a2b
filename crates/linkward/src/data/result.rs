use std::fmt;

use linkward_fetch::NO_STATUS;

use crate::data::Link;

/// Status of a result produced by a rate limit delay rather than a response.
pub const RATE_LIMITED: i32 = -429;

/// Status of a synthetic result reporting a failed aggregate policy.
pub const POLICY_FAILURE: i32 = -5;

/// The outcome of validating one link.
///
/// A result without a message is valid. A result carrying a retry time may
/// be attempted again as long as attempts remain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    link: Link,
    status: i32,
    message: Option<String>,
    retry_at_ms: Option<u64>,
    attempts: u32,
    max_attempts: u32,
}

impl ValidationResult {
    pub fn valid(link: Link, status: i32) -> Self {
        Self {
            link,
            status,
            message: None,
            retry_at_ms: None,
            attempts: 0,
            max_attempts: 0,
        }
    }

    /// A terminal failure.
    pub fn invalid(link: Link, status: i32, message: impl Into<String>) -> Self {
        Self {
            link,
            status,
            message: Some(message.into()),
            retry_at_ms: None,
            attempts: 0,
            max_attempts: 0,
        }
    }

    /// A failure that may succeed when attempted again at `retry_at_ms`.
    pub fn retry(
        link: Link,
        status: i32,
        message: impl Into<String>,
        retry_at_ms: u64,
        attempts: u32,
        max_attempts: u32,
    ) -> Self {
        Self {
            link,
            status,
            message: Some(message.into()),
            retry_at_ms: Some(retry_at_ms),
            attempts,
            max_attempts,
        }
    }

    /// A result whose link could not be fetched at all.
    pub fn unreachable(link: Link, message: impl Into<String>) -> Self {
        Self::invalid(link, NO_STATUS, message)
    }

    #[must_use]
    pub fn with_attempts(mut self, attempts: u32, max_attempts: u32) -> Self {
        self.attempts = attempts;
        self.max_attempts = max_attempts;
        self
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn into_link(self) -> Link {
        self.link
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn retry_at_ms(&self) -> Option<u64> {
        self.retry_at_ms
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_valid(&self) -> bool {
        self.message.is_none()
    }

    pub fn should_retry(&self) -> bool {
        self.retry_at_ms.is_some() && self.attempts < self.max_attempts
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.link.short_display())?;
        match &self.message {
            None => f.write_str(": valid"),
            Some(message) => {
                write!(f, ": {message}, attempted {} times", self.attempts)?;
                for path in self.link.occurrences() {
                    write!(f, "\n        - {}", path.display())?;
                }
                Ok(())
            }
        }
    }
}
