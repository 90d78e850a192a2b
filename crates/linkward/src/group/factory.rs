use std::sync::Arc;

use regex::Regex;

use crate::core::GitHubRawFragmentValidator;
use crate::effects::LinkStream;
use crate::error::{Error, Result};
use crate::group::LinkGroup;

/// Links to files and directories in GitHub repositories.
pub const GITHUB_BLOB_PATTERN: &str = "https://github.com/[^/]+/[^/]+/(?:blob|tree)/.*";

const GITHUB_BLOB_CAPTURE: &str =
    r"https://github.com/([^/]+)/([^/]+)/(?:blob|tree)/([^/]+)/([^#]*)(#.*)?";

const GITHUB_CONTENTS_API: &str = "https://api.github.com/repos/${1}/${2}/contents/${4}?ref=${3}${5}";

/// Builds a preconfigured [`LinkGroup`] on a stream.
///
/// Any `Fn(LinkStream) -> Result<LinkGroup>` is a factory.
pub trait LinkGroupFactory {
    fn create_link_group(&self, stream: LinkStream) -> Result<LinkGroup>;
}

impl<F> LinkGroupFactory for F
where
    F: Fn(LinkStream) -> Result<LinkGroup>,
{
    fn create_link_group(&self, stream: LinkStream) -> Result<LinkGroup> {
        self(stream)
    }
}

/// Checks GitHub blob and tree links through the contents API, with
/// `#L<n>` and `#L<n>-L<m>` fragments validated against the raw file.
///
/// # Errors
///
/// Returns [`Error::MissingToken`] if `token` is empty.
pub fn github_raw_blob_links(token: &str) -> Result<impl LinkGroupFactory> {
    github_blob_links(token, "application/vnd.github.raw+json", true)
}

/// Checks GitHub blob and tree links through the contents API, with
/// fragments looked up in the HTML rendering of the file.
///
/// # Errors
///
/// Returns [`Error::MissingToken`] if `token` is empty.
pub fn github_html_blob_links(token: &str) -> Result<impl LinkGroupFactory> {
    github_blob_links(token, "application/vnd.github.html+json", false)
}

fn github_blob_links(
    token: &str,
    accept: &'static str,
    raw_fragments: bool,
) -> Result<impl LinkGroupFactory> {
    if token.trim().is_empty() {
        return Err(Error::MissingToken);
    }
    let token = token.to_string();
    let capture = Arc::new(Regex::new(GITHUB_BLOB_CAPTURE).map_err(|source| {
        Error::InvalidPattern {
            pattern: GITHUB_BLOB_CAPTURE.to_string(),
            source,
        }
    })?);

    Ok(move |stream: LinkStream| -> Result<LinkGroup> {
        let capture = Arc::clone(&capture);
        let group = stream
            .group(GITHUB_BLOB_PATTERN)?
            .bearer_token(&token)
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header("Accept", accept)
            .link_mapper(move |link| {
                let mapped = capture.replace_all(link.resolved_uri(), GITHUB_CONTENTS_API);
                tracing::debug!("Mapped:\n    {} -> \n    {}", link.resolved_uri(), mapped);
                link.map_to_uri(mapped.into_owned())
            });
        Ok(if raw_fragments {
            group.fragment_validator(GitHubRawFragmentValidator)
        } else {
            group
        })
    })
}
