use regex::Regex;

use crate::error::{Error, Result};

/// Compiles `pattern` so that it only matches whole strings.
pub fn full_match(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$")).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}
