/// Extracts the `charset` parameter from a `Content-Type` header value.
///
/// The parameter name is matched case-insensitively and surrounding quotes
/// are stripped. Returns `None` when the header has no charset.
pub fn parse_charset(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_ascii_lowercase())
    })
}

/// Decodes a response body to text.
///
/// Single-byte Latin charsets are mapped byte-for-byte; everything else,
/// including an absent charset, is read as UTF-8 with invalid sequences
/// replaced.
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    match charset.map(str::to_ascii_lowercase).as_deref() {
        Some("iso-8859-1" | "latin1" | "latin-1" | "us-ascii" | "ascii") => {
            body.iter().map(|&b| b as char).collect()
        }
        Some(other) if !matches!(other, "utf-8" | "utf8") => {
            tracing::debug!("Unsupported charset {other}, decoding as UTF-8");
            String::from_utf8_lossy(body).into_owned()
        }
        _ => String::from_utf8_lossy(body).into_owned(),
    }
}
