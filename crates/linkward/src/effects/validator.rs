//! Fetching and memoizing link validation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use linkward_fetch::{HttpClient, Response, StatusClass, classify_status, retry_at};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{Clock, SystemClock};
use crate::data::{RATE_LIMITED, ValidationResult};
use crate::error::Result;
use crate::group::ValidationRequest;

/// Validates one link.
///
/// Implementations must tolerate concurrent calls and repeated calls for the
/// same link within a run; later calls are how retries happen.
pub trait LinkValidator: Send + Sync {
    fn validate(
        &self,
        request: &ValidationRequest,
    ) -> impl Future<Output = Result<ValidationResult>> + Send;
}

/// The outcome of the latest fetch of a fragmentless URI.
#[derive(Debug, Clone)]
struct CacheEntry {
    response: Arc<Response>,
    message: Option<String>,
    retry_at_ms: Option<u64>,
    attempts: u32,
}

impl CacheEntry {
    fn is_valid(&self) -> bool {
        self.message.is_none()
    }

    /// A retryable fetch is repeated once its retry time has come, as long as
    /// attempts remain.
    fn needs_fetch(&self, max_attempts: u32, now_ms: u64) -> bool {
        self.retry_at_ms
            .is_some_and(|at| self.attempts < max_attempts && now_ms >= at)
    }
}

/// Lazily created async mutexes, one per key, kept for the validator's lifetime.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    fn get(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock();
        Arc::clone(locks.entry(key.to_string()).or_default())
    }
}

/// A [`LinkValidator`] fetching over HTTP.
///
/// Each fragmentless URI is fetched at most once per attempt, no matter how
/// many fragments of it are checked; the parsed body is shared by all of
/// them. Results are memoized per full URI until they are retryable.
///
/// A validator holds the caches of a single run.
#[derive(Debug)]
pub struct HttpLinkValidator<C> {
    client: C,
    clock: Arc<dyn Clock>,
    documents: Mutex<HashMap<String, CacheEntry>>,
    results: Mutex<HashMap<String, ValidationResult>>,
    document_locks: KeyedLocks,
    result_locks: KeyedLocks,
}

impl<C: HttpClient> HttpLinkValidator<C> {
    pub fn new(client: C) -> Self {
        Self::with_clock(client, Arc::new(SystemClock))
    }

    pub fn with_clock(client: C, clock: Arc<dyn Clock>) -> Self {
        Self {
            client,
            clock,
            documents: Mutex::new(HashMap::new()),
            results: Mutex::new(HashMap::new()),
            document_locks: KeyedLocks::default(),
            result_locks: KeyedLocks::default(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    async fn fetch(&self, uri: &str, headers: &[(String, String)], attempt: u32) -> CacheEntry {
        let response = match self.client.get(uri, headers).await {
            Ok(response) => response,
            Err(e) => {
                return CacheEntry {
                    response: Arc::new(Response::none(uri)),
                    message: Some(e.to_string()),
                    retry_at_ms: None,
                    attempts: attempt,
                };
            }
        };

        let status = response.status();
        debug!("Fetched {status}: {uri}");
        let (message, retry_at_ms) = match classify_status(status) {
            StatusClass::Valid => (None, None),
            StatusClass::Retryable => {
                let raw = response.header_value("Retry-After");
                let at = retry_at(raw, self.clock.now_millis());
                let message = match raw {
                    Some(raw) => format!("{status}, Retry-After: {raw}"),
                    None => status.to_string(),
                };
                (Some(message), Some(at))
            }
            StatusClass::Invalid => (Some(status.to_string()), None),
        };

        CacheEntry {
            response: Arc::new(response),
            message,
            retry_at_ms,
            attempts: attempt,
        }
    }

    fn remember(&self, uri: &str, result: ValidationResult) -> ValidationResult {
        if result.is_valid() {
            debug!("    {result}");
        } else {
            warn!("    {result}");
        }
        self.results.lock().insert(uri.to_string(), result.clone());
        result
    }
}

impl<C: HttpClient> LinkValidator for HttpLinkValidator<C> {
    async fn validate(&self, request: &ValidationRequest) -> Result<ValidationResult> {
        let link = &request.link;
        let uri = link.resolved_uri();
        debug!("Validating {uri}");

        let result_lock = self.result_locks.get(uri);
        let _result_guard = result_lock.lock().await;

        let cached = self.results.lock().get(uri).cloned();
        if let Some(cached) = cached.filter(|cached| !cached.should_retry()) {
            return Ok(cached);
        }

        let fragmentless = link.resolved_fragmentless_uri();
        let entry = {
            let document_lock = self.document_locks.get(fragmentless);
            let _document_guard = document_lock.lock().await;

            let now = self.clock.now_millis();
            let group = &request.group;
            let delay = group.rate_limit_ref().schedule(group.pattern_str(), now);
            if delay > 0 {
                let result = ValidationResult::retry(
                    link.clone(),
                    RATE_LIMITED,
                    format!("Delayed {delay} ms due to a rate limit"),
                    now + delay,
                    0,
                    u32::MAX,
                );
                return Ok(self.remember(uri, result));
            }

            let existing = self.documents.lock().get(fragmentless).cloned();
            match existing {
                Some(entry) if !entry.needs_fetch(request.max_attempts, now) => entry,
                existing => {
                    let attempt = existing.map_or(1, |entry| entry.attempts + 1);
                    let entry = self.fetch(fragmentless, group.headers(), attempt).await;
                    group.stats().record(entry.response.status());
                    self.documents
                        .lock()
                        .insert(fragmentless.to_string(), entry.clone());
                    entry
                }
            }
        };

        let result = if entry.is_valid() {
            request
                .group
                .fragment_validator_ref()
                .validate(link, &entry.response)?
                .with_attempts(entry.attempts, request.max_attempts)
        } else {
            let message = entry.message.clone().unwrap_or_default();
            match entry.retry_at_ms {
                Some(at) => ValidationResult::retry(
                    link.clone(),
                    entry.response.status(),
                    message,
                    at,
                    entry.attempts,
                    request.max_attempts,
                ),
                None => ValidationResult::invalid(link.clone(), entry.response.status(), message)
                    .with_attempts(entry.attempts, request.max_attempts),
            }
        };
        Ok(self.remember(uri, result))
    }
}
