/// How a fetch outcome should be treated by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The resource exists.
    Valid,
    /// The server asked us to come back later.
    Retryable,
    /// The resource is broken and retrying will not help.
    Invalid,
}

/// Classifies an HTTP status code.
///
/// # Recognized Retryable Codes
///
/// - 301: Moved Permanently (servers hand these out while shuffling content)
/// - 429: Too Many Requests
/// - 500, 501, 502, 503, 504: server-side trouble
///
/// Only `200` counts as valid; every other code, including negative markers
/// used for "no response", is invalid.
///
/// # Examples
///
/// ```
/// use linkward_fetch::{StatusClass, classify_status};
///
/// assert_eq!(classify_status(200), StatusClass::Valid);
/// assert_eq!(classify_status(503), StatusClass::Retryable);
/// assert_eq!(classify_status(404), StatusClass::Invalid);
/// ```
pub fn classify_status(status: i32) -> StatusClass {
    match status {
        200 => StatusClass::Valid,
        301 | 429 | 500 | 501 | 502 | 503 | 504 => StatusClass::Retryable,
        _ => StatusClass::Invalid,
    }
}
