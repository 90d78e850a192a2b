use std::fmt;
use std::path::Path;

use crate::data::{Link, SourceLocation};

/// Maps a link found in a generated file back to where it was authored.
pub trait SourceResolver: Send + Sync + fmt::Debug {
    fn find_source(&self, link: &Link, generated_file: &Path) -> SourceLocation;
}

/// Points at the line of the generated file that contains the link.
///
/// The file is searched for the original URI, then the resolved URI, then
/// the bare fragment and finally the URI path. When none of them is found or
/// the file cannot be read, the location has no line.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratedFileResolver;

impl SourceResolver for GeneratedFileResolver {
    fn find_source(&self, link: &Link, generated_file: &Path) -> SourceLocation {
        let source = match std::fs::read_to_string(generated_file) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!("Could not read {}: {}", generated_file.display(), e);
                return SourceLocation::new(generated_file, None);
            }
        };

        let fragment = link.fragment().map(|f| &f[1..]);
        let path = uri_path(link.resolved_uri());
        let line = [Some(link.original_uri()), Some(link.resolved_uri()), fragment, path]
            .into_iter()
            .flatten()
            .filter(|needle| !needle.is_empty())
            .find_map(|needle| source.find(needle))
            .map(|pos| line_of(&source, pos));

        SourceLocation::new(generated_file, line)
    }
}

/// The path component of an absolute URI, without query or fragment.
fn uri_path(uri: &str) -> Option<&str> {
    let (_, rest) = uri.split_once("://")?;
    let start = rest.find('/')?;
    let path = &rest[start..];
    let end = path.find(['?', '#']).unwrap_or(path.len());
    Some(&path[..end])
}

/// 1-based line number of the byte offset `pos`.
fn line_of(source: &str, pos: usize) -> usize {
    source[..pos].bytes().filter(|&b| b == b'\n').count() + 1
}
