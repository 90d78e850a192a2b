//! The orchestrator of a validation run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{StreamExt, TryStreamExt, stream};
use linkward_fetch::HttpClient;
use tracing::{debug, info};

use crate::core::{Clock, SystemClock, full_match};
use crate::data::{Link, ValidationResult};
use crate::effects::{
    GeneratedFileResolver, HttpLinkValidator, LinkValidator, SourceResolver, ValidationErrorStream,
};
use crate::error::Result;
use crate::group::{LinkGroup, LinkGroupFactory, ValidationRequest};

/// Default for [`LinkStream::overall_timeout`].
pub const DEFAULT_OVERALL_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Default for [`LinkStream::retry_attempts`].
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 1;

/// A finite set of links and the settings to validate them with.
///
/// Filters and settings return a new stream. [`validate`](Self::validate)
/// consumes it and yields the links that are broken.
#[derive(Debug, Clone)]
pub struct LinkStream {
    links: Vec<Link>,
    groups: Vec<LinkGroup>,
    retry_attempts: u32,
    overall_timeout: Duration,
    concurrency: usize,
    clock: Arc<dyn Clock>,
    source_resolver: Arc<dyn SourceResolver>,
}

impl LinkStream {
    pub fn new(links: impl IntoIterator<Item = Link>) -> Self {
        Self {
            links: links.into_iter().collect(),
            groups: LinkGroup::catch_all().into_iter().collect(),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            overall_timeout: DEFAULT_OVERALL_TIMEOUT,
            concurrency: 1,
            clock: Arc::new(SystemClock),
            source_resolver: Arc::new(GeneratedFileResolver),
        }
    }

    /// A stream of absolute URIs without occurrences.
    pub fn from_uris<S: Into<String>>(uris: impl IntoIterator<Item = S>) -> Self {
        Self::new(uris.into_iter().map(Link::of_resolved))
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// The committed groups, the catch-all group last.
    pub fn groups(&self) -> &[LinkGroup] {
        &self.groups
    }

    fn filter(mut self, keep: impl Fn(&Link) -> bool) -> Self {
        self.links.retain(|link| keep(link));
        self
    }

    #[must_use]
    pub fn exclude(self, exclude: impl Fn(&Link) -> bool) -> Self {
        self.filter(|link| !exclude(link))
    }

    /// Drops the links whose resolved URI fully matches `pattern`.
    pub fn exclude_resolved(self, pattern: &str) -> Result<Self> {
        let regex = full_match(pattern)?;
        Ok(self.filter(|link| !regex.is_match(link.resolved_uri())))
    }

    /// Drops the links whose resolved URI is one of `uris`.
    #[must_use]
    pub fn exclude_resolved_uris<S: Into<String>>(self, uris: impl IntoIterator<Item = S>) -> Self {
        let uris: HashSet<String> = uris.into_iter().map(Into::into).collect();
        self.filter(|link| !uris.contains(link.resolved_uri()))
    }

    /// Keeps only the links whose resolved URI fully matches `pattern`.
    pub fn include_resolved(self, pattern: &str) -> Result<Self> {
        let regex = full_match(pattern)?;
        Ok(self.filter(|link| regex.is_match(link.resolved_uri())))
    }

    #[must_use]
    pub fn exclude_localhost(self) -> Self {
        self.exclude(Link::is_localhost)
    }

    #[must_use]
    pub fn log(self) -> Self {
        for link in &self.links {
            info!("{link}");
        }
        self
    }

    /// How many times a retryable failure is attempted again.
    #[must_use]
    pub fn retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = retry_attempts;
        self
    }

    /// Upper bound for the whole run; requests not started by then are
    /// reported as timed out.
    #[must_use]
    pub fn overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = timeout;
        self
    }

    /// How many requests the first pass may have in flight. `1` validates
    /// strictly in order.
    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn source_resolver(mut self, resolver: impl SourceResolver + 'static) -> Self {
        self.source_resolver = Arc::new(resolver);
        self
    }

    /// Starts a group of links whose resolved URI fully matches `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`](crate::Error::InvalidPattern) if
    /// `pattern` is not a valid regex.
    pub fn group(self, pattern: &str) -> Result<LinkGroup> {
        LinkGroup::new(Some(self), pattern)
    }

    /// Starts a preconfigured group.
    pub fn group_with(self, factory: impl LinkGroupFactory) -> Result<LinkGroup> {
        factory.create_link_group(self)
    }

    pub(crate) fn insert_group(mut self, group: LinkGroup) -> Self {
        let at = self.groups.len().saturating_sub(1);
        self.groups.insert(at, group);
        self
    }

    /// Validates every link over HTTP with `client`.
    pub async fn validate<C: HttpClient>(self, client: C) -> Result<ValidationErrorStream> {
        let validator = HttpLinkValidator::with_clock(client, Arc::clone(&self.clock));
        self.validate_with(&validator).await
    }

    /// Validates every link with `validator`.
    ///
    /// # Errors
    ///
    /// Fails only when a fragment validator fails, e.g. on a fragment that is
    /// not a usable selector. Broken links are reported in the returned stream.
    pub async fn validate_with<V: LinkValidator>(self, validator: &V) -> Result<ValidationErrorStream> {
        let Self {
            links,
            groups,
            retry_attempts,
            overall_timeout,
            concurrency,
            clock,
            source_resolver,
        } = self;

        let timeout_ms = overall_timeout.as_millis() as u64;
        let run = Run {
            validator,
            clock: clock.as_ref(),
            deadline: clock.now_millis().saturating_add(timeout_ms),
            timeout_ms,
        };

        let links = groups
            .iter()
            .flat_map(LinkGroup::stream_transformers)
            .fold(links, |links, transform| transform(links));

        let groups: Vec<Arc<LinkGroup>> = groups.into_iter().map(Arc::new).collect();
        let max_attempts = retry_attempts.saturating_add(1);
        let requests: Vec<ValidationRequest> = links
            .into_iter()
            .filter_map(|link| {
                let group = groups
                    .iter()
                    .find(|group| group.matches(link.resolved_uri()))
                    .or_else(|| groups.last())?;
                let link = group.map_link(&link);
                Some(ValidationRequest::new(link, max_attempts, Arc::clone(group)))
            })
            .collect();

        let first_pass: Vec<_> = stream::iter(&requests)
            .map(|request| run.dispatch(request))
            .buffered(concurrency.max(1))
            .try_collect()
            .await?;

        let mut failures = Vec::new();
        let mut retries = Vec::new();
        for (request, result) in requests.iter().zip(first_pass) {
            match result {
                Some(result) if result.should_retry() => retries.push((request, result)),
                Some(result) if !result.is_valid() => failures.push(result),
                _ => {}
            }
        }

        run.drain_retries(retries, &mut failures).await?;

        for group in &groups {
            failures.extend(group.apply_final_policies());
        }

        Ok(ValidationErrorStream::new(failures, source_resolver))
    }
}

/// State shared by all requests of one run.
struct Run<'a, V> {
    validator: &'a V,
    clock: &'a dyn Clock,
    deadline: u64,
    timeout_ms: u64,
}

impl<V: LinkValidator> Run<'_, V> {
    /// First attempt of a request. `None` when a continuation policy stopped
    /// the group.
    async fn dispatch(&self, request: &ValidationRequest) -> Result<Option<ValidationResult>> {
        if !request.should_continue() {
            debug!("Skipping {}: continuation policy failed", request.link.resolved_uri());
            return Ok(None);
        }
        if self.clock.now_millis() >= self.deadline {
            return Ok(Some(ValidationResult::unreachable(
                request.link.clone(),
                format!("Did not try, overall timeout of {} ms expired", self.timeout_ms),
            )));
        }
        self.validator.validate(request).await.map(Some)
    }

    /// Retries in order of retry time until every request is settled.
    async fn drain_retries(
        &self,
        mut retries: Vec<(&ValidationRequest, ValidationResult)>,
        failures: &mut Vec<ValidationResult>,
    ) -> Result<()> {
        while let Some(next) = retries
            .iter()
            .enumerate()
            .min_by_key(|(_, (_, result))| result.retry_at_ms())
            .map(|(i, _)| i)
        {
            let (request, previous) = retries.remove(next);
            if !request.should_continue() {
                debug!("Not retrying {}: continuation policy failed", request.link.resolved_uri());
                continue;
            }

            let retry_at = previous.retry_at_ms().unwrap_or(self.deadline);
            if retry_at >= self.deadline {
                let attempts = previous.attempts();
                let max_attempts = previous.max_attempts();
                failures.push(
                    ValidationResult::unreachable(
                        previous.into_link(),
                        format!("Did not try again, overall timeout of {} ms expired", self.timeout_ms),
                    )
                    .with_attempts(attempts, max_attempts),
                );
                continue;
            }

            let now = self.clock.now_millis();
            if retry_at > now {
                let delay = retry_at - now;
                info!("Sleeping {delay} ms to retry {previous}");
                self.clock.sleep(Duration::from_millis(delay)).await;
            }

            let result = self.validator.validate(request).await?;
            if result.should_retry() {
                retries.push((request, result));
            } else if !result.is_valid() {
                failures.push(result);
            }
        }
        Ok(())
    }
}
