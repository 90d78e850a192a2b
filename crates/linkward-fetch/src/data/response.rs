use std::sync::OnceLock;

use bytes::Bytes;

use crate::core::{decode_body, parse_charset};
use crate::data::{HtmlDocument, RawTextDocument};

/// Status code of a response that never arrived.
pub const NO_STATUS: i32 = -1;

/// A fetched resource.
///
/// The decoded text and the typed views over it are computed on first access
/// and memoized for the lifetime of the response.
#[derive(Debug, Default)]
pub struct Response {
    uri: String,
    status: i32,
    headers: Vec<(String, String)>,
    content_type: Option<String>,
    charset: Option<String>,
    body: Bytes,
    text: OnceLock<String>,
    html: OnceLock<HtmlDocument>,
    raw_text: OnceLock<RawTextDocument>,
}

impl Response {
    /// A placeholder for a request that produced no response at all.
    pub fn none(uri: impl Into<String>) -> Self {
        Self::new(uri, NO_STATUS)
    }

    pub fn new(uri: impl Into<String>, status: i32) -> Self {
        Self {
            uri: uri.into(),
            status,
            ..Default::default()
        }
    }

    /// Adds a response header.
    ///
    /// A `Content-Type` header also sets the content type and charset.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        if name.eq_ignore_ascii_case("content-type") {
            self = self.content_type(value.clone());
        }
        self.headers.push((name, value));
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        let content_type = content_type.into();
        self.charset = parse_charset(&content_type);
        self.content_type = Some(content_type);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn status(&self) -> i32 {
        self.status
    }

    /// Looks up a header value, matching the name case-insensitively.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn content_type_value(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// The body decoded with the response charset.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| {
            let text = decode_body(&self.body, self.charset.as_deref());
            tracing::trace!("Body of {}:\n{}", self.uri, text);
            text
        })
    }

    /// The body parsed as HTML.
    pub fn html(&self) -> &HtmlDocument {
        self.html.get_or_init(|| HtmlDocument::parse(self.text()))
    }

    /// The body viewed as numbered lines.
    pub fn raw_text(&self) -> &RawTextDocument {
        self.raw_text.get_or_init(|| RawTextDocument::new(self.text()))
    }
}
