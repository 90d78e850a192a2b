//! Link list files.
//!
//! One link per line: the absolute URI followed by the files it occurs in,
//! separated by whitespace. Blank lines and lines starting with `#` are
//! skipped. Repeated URIs are merged.
//!
//! ```text
//! # from the site build
//! https://example.com/guide.html#install  site/index.html site/faq.html
//! https://example.com/api.html
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use linkward::Link;

pub fn read_links(path: &Path) -> anyhow::Result<Vec<Link>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read link list {}", path.display()))?;
    Ok(parse_links(&source))
}

pub fn parse_links(source: &str) -> Vec<Link> {
    let links = source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let uri = fields.next()?;
            Some(Link::new(uri, uri, fields.map(PathBuf::from)))
        });
    Link::merge_occurrences(links)
}
