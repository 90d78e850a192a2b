//! Per-pattern configuration of a validation run.
//!
//! A [`LinkGroup`] bundles what applies to the links matching one pattern:
//! extra headers, URI rewriting, a rate limit, ordering, policies and the
//! fragment validator. Its [`LinkGroupStats`] collect the statuses seen by
//! every request routed to it.

pub mod factory;
pub mod link_group;
pub mod request;
pub mod stats;

pub use factory::{
    GITHUB_BLOB_PATTERN, LinkGroupFactory, github_html_blob_links, github_raw_blob_links,
};
pub use link_group::{LinkGroup, LinkMapper, StreamTransformer};
pub use request::ValidationRequest;
pub use stats::LinkGroupStats;
