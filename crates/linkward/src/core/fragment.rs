use linkward_fetch::Response;

use crate::data::{Link, ValidationResult};
use crate::error::{Error, Result};

/// Checks whether the fragment of a link exists in the fetched resource.
///
/// Validators are only consulted for successful fetches. An `Err` aborts
/// the whole run; a missing fragment is an invalid [`ValidationResult`].
pub trait FragmentValidator: Send + Sync {
    fn validate(&self, link: &Link, response: &Response) -> Result<ValidationResult>;
}

impl<F> FragmentValidator for F
where
    F: Fn(&Link, &Response) -> Result<ValidationResult> + Send + Sync,
{
    fn validate(&self, link: &Link, response: &Response) -> Result<ValidationResult> {
        self(link, response)
    }
}

/// Accepts every fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysValid;

impl FragmentValidator for AlwaysValid {
    fn validate(&self, link: &Link, response: &Response) -> Result<ValidationResult> {
        Ok(ValidationResult::valid(link.clone(), response.status()))
    }
}

/// Looks fragments up in an HTML page.
///
/// In order, a fragment matches:
/// - an element id, when the fragment contains `(`, `)`, `,` or `.` as
///   Javadoc anchors do (those are not usable in a CSS selector)
/// - the fragment used as a CSS selector
/// - an `<a name="...">` anchor
/// - an element with id `user-content-<id>`, as GitHub renders markdown headings
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFragmentValidator;

impl FragmentValidator for HtmlFragmentValidator {
    fn validate(&self, link: &Link, response: &Response) -> Result<ValidationResult> {
        let Some(fragment) = link.fragment() else {
            return Ok(ValidationResult::valid(link.clone(), response.status()));
        };
        let id = &fragment[1..];
        let doc = response.html();

        let found = if fragment.contains(['(', ')', ',', '.']) {
            doc.has_id(id)
        } else {
            let selected = doc.select_any(fragment).map_err(|source| {
                tracing::error!("Bad fragment: {} in URI {}", fragment, link.original_uri());
                Error::Selector {
                    uri: link.original_uri().to_string(),
                    source,
                }
            })?;
            selected || doc.has_anchor_named(id) || doc.has_id(&format!("user-content-{id}"))
        };

        if found {
            Ok(ValidationResult::valid(link.clone(), response.status()))
        } else {
            Ok(ValidationResult::invalid(
                link.clone(),
                response.status(),
                format!("Could not find {fragment}"),
            ))
        }
    }
}

/// Checks `#L<n>` and `#L<n>-L<m>` line references against a raw text body.
///
/// This is what GitHub's contents API returns for
/// `Accept: application/vnd.github.raw+json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitHubRawFragmentValidator;

enum LineRef {
    Line(usize),
    Lines(usize, usize),
    OutOfRange,
}

fn parse_line_ref(fragment: &str) -> Option<LineRef> {
    fn number(digits: &str) -> Option<std::result::Result<usize, ()>> {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(digits.parse().map_err(|_| ()))
    }

    let spec = fragment.strip_prefix("#L")?;
    match spec.split_once("-L") {
        Some((start, end)) => match (number(start)?, number(end)?) {
            (Ok(start), Ok(end)) => Some(LineRef::Lines(start, end)),
            _ => Some(LineRef::OutOfRange),
        },
        None => match number(spec)? {
            Ok(line) => Some(LineRef::Line(line)),
            Err(()) => Some(LineRef::OutOfRange),
        },
    }
}

impl FragmentValidator for GitHubRawFragmentValidator {
    fn validate(&self, link: &Link, response: &Response) -> Result<ValidationResult> {
        let Some(fragment) = link.fragment() else {
            return Ok(ValidationResult::valid(link.clone(), response.status()));
        };

        let found = match parse_line_ref(fragment) {
            Some(LineRef::Line(line)) => response.raw_text().has_line(line),
            Some(LineRef::Lines(start, end)) => response.raw_text().has_lines(start, end),
            Some(LineRef::OutOfRange) => false,
            None => {
                return Ok(ValidationResult::invalid(
                    link.clone(),
                    response.status(),
                    format!("Fragment {fragment} not supported"),
                ));
            }
        };

        if found {
            Ok(ValidationResult::valid(link.clone(), response.status()))
        } else {
            Ok(ValidationResult::invalid(
                link.clone(),
                response.status(),
                format!("Fragment {fragment} not found"),
            ))
        }
    }
}
