//! Pure transformations for HTTP fetching.
//!
//! This module contains the functions that interpret what a server sent
//! without performing any I/O: how a status code is classified, when a
//! `Retry-After` header allows the next attempt, and how a body is decoded.

mod charset;
mod retry;
mod status;

pub use charset::{decode_body, parse_charset};
pub use retry::{RETRY_AFTER_DEFAULT, RETRY_AFTER_MAX, retry_at};
pub use status::{StatusClass, classify_status};
