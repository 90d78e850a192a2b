//! Validation of links found in generated documentation.
//!
//! A [`LinkStream`] takes a finite set of [`Link`]s, routes each one to the
//! first [`LinkGroup`] whose pattern matches it, fetches every resource once,
//! checks fragments, retries what the server asked to retry and finally
//! evaluates per-group [`AggregatePolicy`]s. What remains broken comes back as
//! a [`ValidationErrorStream`].
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable values: links, results, source locations
//! - [`core`] - Pure logic: clocks, rate limits, policies, fragment checks
//! - [`group`] - Per-pattern configuration and its shared statistics
//! - [`effects`] - The fetching validator and the orchestrating stream
//!
//! # Example
//!
//! ```no_run
//! use linkward::{Link, LinkStream, RequestsPerInterval};
//! use std::time::Duration;
//!
//! # async fn run() -> linkward::Result<()> {
//! let links = vec![Link::of_resolved("https://example.com/guide.html#install")];
//! LinkStream::new(links)
//!     .retry_attempts(2)
//!     .group("https://api\\.example\\.com/.*")?
//!     .rate_limit(RequestsPerInterval::new(10, Duration::from_secs(1)))
//!     .end_group()?
//!     .validate(linkward_fetch::ReqwestClient::new()?)
//!     .await?
//!     .assert_valid()
//! # }
//! ```

pub mod config;
pub mod core;
pub mod data;
pub mod effects;
mod error;
pub mod group;

pub use config::CheckConfig;
pub use core::{
    AggregatePolicy, AlwaysValid, Clock, FragmentValidator, GitHubRawFragmentValidator,
    HtmlFragmentValidator, ManualClock, PolicyOutcome, RateLimit, RequestsPerInterval,
    SystemClock, Unlimited, count_at_least, count_at_most,
};
pub use data::{Link, SourceLocation, ValidationResult};
pub use effects::{
    GeneratedFileResolver, HttpLinkValidator, LinkStream, LinkValidator, SourceResolver,
    ValidationErrorStream,
};
pub use error::{Error, Result};
pub use group::{LinkGroup, LinkGroupFactory, LinkGroupStats, ValidationRequest};
