//! HTTP fetching with memoized response views for link validation.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable responses and the typed views derived from their bodies
//! - [`core`] - Pure transformations: status classification, `Retry-After`, charsets
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Key Features
//!
//! - **Error-Tolerant**: non-2xx responses are returned for inspection, never raised
//! - **Memoized Views**: a body is decoded, parsed as HTML or counted for lines at most once
//! - **Mechanism-Only**: No policy; retry orchestration and caching live in `linkward`

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{
    RETRY_AFTER_DEFAULT, RETRY_AFTER_MAX, StatusClass, classify_status, decode_body,
    parse_charset, retry_at,
};
pub use data::{HtmlDocument, NO_STATUS, RawTextDocument, Response};
pub use effects::HttpClient;

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::FetchError;
