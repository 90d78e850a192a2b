//! I/O operations for fetching resources.
//!
//! [`HttpClient`] is the seam between the validation engine and the network;
//! tests substitute an in-process implementation.

pub mod http;

pub use http::HttpClient;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
