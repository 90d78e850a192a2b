//! Immutable data types for fetched resources.
//!
//! A [`Response`] owns the raw body; the typed views ([`HtmlDocument`],
//! [`RawTextDocument`]) are derived from it lazily and memoized, so every
//! fragment of the same document shares one parse.

pub mod html;
pub mod response;
pub mod text;

pub use html::HtmlDocument;
pub use response::{NO_STATUS, Response};
pub use text::RawTextDocument;
