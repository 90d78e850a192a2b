use std::time::Duration;

use chrono::DateTime;

/// Delay used when a `Retry-After` header is missing or unparseable.
pub const RETRY_AFTER_DEFAULT: Duration = Duration::from_secs(60);

/// Upper bound on any delay a server can ask for.
pub const RETRY_AFTER_MAX: Duration = Duration::from_secs(120);

/// Computes the epoch millisecond at which a request may be retried.
///
/// # Arguments
///
/// * `raw` - The raw `Retry-After` header value, if the server sent one
/// * `now_ms` - The current time in epoch milliseconds
///
/// # Formats
///
/// - Delay seconds (`"20"`): `now + min(seconds, 120s)`
/// - HTTP date (`"Thu, 01 Jan 1970 00:00:00 GMT"`): the date, capped at `now + 120s`
/// - Anything else, or no header: `now + 60s`
///
/// # Examples
///
/// ```
/// use linkward_fetch::retry_at;
///
/// assert_eq!(retry_at(Some("20"), 1_000), 21_000);
/// assert_eq!(retry_at(None, 1_000), 61_000);
/// ```
pub fn retry_at(raw: Option<&str>, now_ms: u64) -> u64 {
    let max_ms = RETRY_AFTER_MAX.as_millis() as u64;
    let default_ms = RETRY_AFTER_DEFAULT.as_millis() as u64;

    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return now_ms.saturating_add(default_ms);
    };

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let delay_ms = raw
            .parse::<u64>()
            .map(|seconds| seconds.saturating_mul(1000))
            .unwrap_or(u64::MAX);
        return now_ms.saturating_add(delay_ms.min(max_ms));
    }

    match DateTime::parse_from_rfc2822(raw) {
        Ok(date) => {
            let epoch_ms = date.timestamp_millis().max(0) as u64;
            epoch_ms.min(now_ms.saturating_add(max_ms))
        }
        Err(e) => {
            tracing::warn!("Could not parse Retry-After value {raw:?}: {e}");
            now_ms.saturating_add(default_ms)
        }
    }
}
