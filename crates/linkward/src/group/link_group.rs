use std::fmt;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::core::{
    AggregatePolicy, FragmentValidator, HtmlFragmentValidator, PolicyOutcome, RateLimit,
    Unlimited, full_match,
};
use crate::data::{Link, POLICY_FAILURE, ValidationResult};
use crate::effects::LinkStream;
use crate::error::{Error, Result};
use crate::group::LinkGroupStats;

/// Rewrites a link before it is fetched.
pub type LinkMapper = Arc<dyn Fn(&Link) -> Link + Send + Sync>;

/// Reorders or filters the whole link sequence before dispatch.
pub type StreamTransformer = Arc<dyn Fn(Vec<Link>) -> Vec<Link> + Send + Sync>;

/// Settings shared by every link whose resolved URI matches a pattern.
///
/// Groups are built from a [`LinkStream`] with [`LinkStream::group`] and
/// committed back with [`LinkGroup::end_group`]. Every setter returns a new
/// group; copies share the same [`LinkGroupStats`].
///
/// # Examples
///
/// ```
/// use linkward::{Link, LinkStream, RequestsPerInterval, count_at_most};
/// use std::time::Duration;
///
/// # fn main() -> linkward::Result<()> {
/// let stream = LinkStream::new(vec![Link::of_resolved("https://example.com/a")])
///     .group("https://example\\.com/.*")?
///     .bearer_token("s3cr3t")
///     .rate_limit(RequestsPerInterval::new(5, Duration::from_secs(1)))
///     .continuation_policy(count_at_most(429, 0))
///     .end_group()?;
/// assert_eq!(stream.groups().len(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LinkGroup {
    parent: Option<Box<LinkStream>>,
    pattern: String,
    regex: Regex,
    headers: Arc<[(String, String)]>,
    link_mapper: LinkMapper,
    rate_limit: Arc<dyn RateLimit>,
    stream_transformers: Vec<StreamTransformer>,
    continuation_policies: Vec<Arc<dyn AggregatePolicy>>,
    final_policies: Vec<Arc<dyn AggregatePolicy>>,
    stats: Arc<LinkGroupStats>,
    fragment_validator: Arc<dyn FragmentValidator>,
}

impl fmt::Debug for LinkGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkGroup")
            .field("pattern", &self.pattern)
            .field("headers", &self.headers)
            .field("rate_limit", &self.rate_limit)
            .field("stream_transformers", &self.stream_transformers.len())
            .field("continuation_policies", &self.continuation_policies.len())
            .field("final_policies", &self.final_policies.len())
            .field("stats", &self.stats)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

impl LinkGroup {
    pub(crate) fn new(parent: Option<LinkStream>, pattern: &str) -> Result<Self> {
        Ok(Self {
            parent: parent.map(Box::new),
            pattern: pattern.to_string(),
            regex: full_match(pattern)?,
            headers: Arc::new([]),
            link_mapper: Arc::new(Link::clone),
            rate_limit: Arc::new(Unlimited),
            stream_transformers: Vec::new(),
            continuation_policies: Vec::new(),
            final_policies: Vec::new(),
            stats: Arc::new(LinkGroupStats::default()),
            fragment_validator: Arc::new(HtmlFragmentValidator),
        })
    }

    /// The group matching every URI, always evaluated last.
    pub(crate) fn catch_all() -> Result<Self> {
        Self::new(None, ".*")
    }

    /// Replaces the pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] if `pattern` is not a valid regex.
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        self.regex = full_match(pattern)?;
        self.pattern = pattern.to_string();
        Ok(self)
    }

    /// The pattern as it was given.
    pub fn pattern_str(&self) -> &str {
        &self.pattern
    }

    /// Whether `uri` matches the pattern in full.
    pub fn matches(&self, uri: &str) -> bool {
        self.regex.is_match(uri)
    }

    /// Appends a header; earlier values with the same name are kept.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut headers: Vec<_> = self.headers.iter().cloned().collect();
        headers.push((key.into(), value.into()));
        self.headers = Arc::from(headers);
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.header("Authorization", format!("Basic {credentials}"))
    }

    #[must_use]
    pub fn bearer_token(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    #[must_use]
    pub fn link_mapper(mut self, mapper: impl Fn(&Link) -> Link + Send + Sync + 'static) -> Self {
        self.link_mapper = Arc::new(mapper);
        self
    }

    pub(crate) fn map_link(&self, link: &Link) -> Link {
        (self.link_mapper)(link)
    }

    #[must_use]
    pub fn rate_limit(mut self, rate_limit: impl RateLimit + 'static) -> Self {
        self.rate_limit = Arc::new(rate_limit);
        self
    }

    pub fn rate_limit_ref(&self) -> &dyn RateLimit {
        self.rate_limit.as_ref()
    }

    /// Validates the members of this group in random order, after all other
    /// links.
    ///
    /// Links outside the group keep their relative order.
    #[must_use]
    pub fn random_order(mut self) -> Self {
        let regex = self.regex.clone();
        self.stream_transformers.push(Arc::new(move |links: Vec<Link>| {
            let (mut members, mut rest): (Vec<_>, Vec<_>) = links
                .into_iter()
                .partition(|link| regex.is_match(link.resolved_uri()));
            members.shuffle(&mut rand::rng());
            rest.append(&mut members);
            rest
        }));
        self
    }

    pub(crate) fn stream_transformers(&self) -> &[StreamTransformer] {
        &self.stream_transformers
    }

    /// Adds a policy checked before each request of this group.
    ///
    /// Once any continuation policy fails, the remaining members of the group
    /// are skipped without being reported.
    #[must_use]
    pub fn continuation_policy(mut self, policy: impl AggregatePolicy + 'static) -> Self {
        self.continuation_policies.push(Arc::new(policy));
        self
    }

    pub fn continuation_policies(&self) -> &[Arc<dyn AggregatePolicy>] {
        &self.continuation_policies
    }

    /// Adds a policy checked once after all requests have settled.
    #[must_use]
    pub fn final_policy(mut self, policy: impl AggregatePolicy + 'static) -> Self {
        self.final_policies.push(Arc::new(policy));
        self
    }

    #[must_use]
    pub fn fragment_validator(mut self, validator: impl FragmentValidator + 'static) -> Self {
        self.fragment_validator = Arc::new(validator);
        self
    }

    pub fn fragment_validator_ref(&self) -> &dyn FragmentValidator {
        self.fragment_validator.as_ref()
    }

    pub fn stats(&self) -> &LinkGroupStats {
        &self.stats
    }

    /// Commits this group to the stream it was created from.
    ///
    /// The group goes after the groups committed before it and before the
    /// catch-all group, so the first committed group has precedence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParentlessGroup`] if the group has no stream.
    pub fn end_group(mut self) -> Result<LinkStream> {
        let parent = self.parent.take().ok_or(Error::ParentlessGroup)?;
        Ok(parent.insert_group(self))
    }

    /// One synthetic result per failing final policy.
    pub(crate) fn apply_final_policies(&self) -> Vec<ValidationResult> {
        self.final_policies
            .iter()
            .filter_map(|policy| match policy.apply(&self.stats) {
                PolicyOutcome::Valid => None,
                PolicyOutcome::Invalid(message) => Some(ValidationResult::invalid(
                    Link::of_resolved(self.pattern.as_str()),
                    POLICY_FAILURE,
                    message,
                )),
            })
            .collect()
    }
}
