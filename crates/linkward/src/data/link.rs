use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

/// A URI found in one or more generated documents.
///
/// Identity is the pair (original URI, resolved URI); the occurrences and the
/// mapping history are carried along for reporting only.
#[derive(Debug, Clone)]
pub struct Link {
    original_uri: String,
    resolved_uri: String,
    fragment_start: Option<usize>,
    occurrences: BTreeSet<PathBuf>,
    mapped_from: Option<Arc<Link>>,
}

impl Link {
    /// A link whose original and resolved forms are the same absolute URI.
    pub fn of_resolved(absolute_uri: impl Into<String>) -> Self {
        let uri = absolute_uri.into();
        Self::new(uri.clone(), uri, BTreeSet::new())
    }

    pub fn new(
        original_uri: impl Into<String>,
        resolved_uri: impl Into<String>,
        occurrences: impl IntoIterator<Item = PathBuf>,
    ) -> Self {
        Self::build(
            None,
            original_uri.into(),
            resolved_uri.into(),
            occurrences.into_iter().collect(),
        )
    }

    fn build(
        mapped_from: Option<Arc<Link>>,
        original_uri: String,
        resolved_uri: String,
        occurrences: BTreeSet<PathBuf>,
    ) -> Self {
        // A lone trailing `#` is not a fragment
        let fragment_start = resolved_uri
            .find('#')
            .filter(|&pos| pos < resolved_uri.len() - 1);
        Self {
            original_uri,
            resolved_uri,
            fragment_start,
            occurrences,
            mapped_from,
        }
    }

    /// The URI as written in the source document.
    pub fn original_uri(&self) -> &str {
        &self.original_uri
    }

    /// The absolute URI to fetch.
    pub fn resolved_uri(&self) -> &str {
        &self.resolved_uri
    }

    /// The resolved URI up to its fragment.
    pub fn resolved_fragmentless_uri(&self) -> &str {
        match self.fragment_start {
            Some(pos) => &self.resolved_uri[..pos],
            None => &self.resolved_uri,
        }
    }

    /// The fragment including its leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment_start.map(|pos| &self.resolved_uri[pos..])
    }

    pub fn occurrences(&self) -> &BTreeSet<PathBuf> {
        &self.occurrences
    }

    /// The link this one was rewritten from, if any.
    pub fn mapped_from(&self) -> Option<&Link> {
        self.mapped_from.as_deref()
    }

    #[must_use]
    pub fn with_occurrences(&self, occurrences: impl IntoIterator<Item = PathBuf>) -> Self {
        Self::build(
            self.mapped_from.clone(),
            self.original_uri.clone(),
            self.resolved_uri.clone(),
            occurrences.into_iter().collect(),
        )
    }

    /// Rewrites the resolved URI, remembering `self` as the source.
    #[must_use]
    pub fn map_to_uri(&self, resolved_uri: impl Into<String>) -> Self {
        Self::build(
            Some(Arc::new(self.clone())),
            self.original_uri.clone(),
            resolved_uri.into(),
            self.occurrences.clone(),
        )
    }

    pub fn is_localhost(&self) -> bool {
        ["//localhost", "//127.0.0.1", "//[::1]"]
            .iter()
            .any(|host| self.resolved_uri.contains(host))
    }

    /// `original` or `original -> resolved`.
    pub fn short_display(&self) -> String {
        if self.original_uri == self.resolved_uri {
            self.original_uri.clone()
        } else {
            format!("{} -> {}", self.original_uri, self.resolved_uri)
        }
    }

    /// Collapses equal links into one, uniting their occurrences.
    ///
    /// The result is sorted by link order.
    pub fn merge_occurrences(links: impl IntoIterator<Item = Link>) -> Vec<Link> {
        let mut merged: BTreeMap<Link, BTreeSet<PathBuf>> = BTreeMap::new();
        for link in links {
            let occurrences = link.occurrences.clone();
            merged.entry(link).or_default().extend(occurrences);
        }
        merged
            .into_iter()
            .map(|(mut link, occurrences)| {
                link.occurrences = occurrences;
                link
            })
            .collect()
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.original_uri == other.original_uri && self.resolved_uri == other.resolved_uri
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.original_uri.hash(state);
        self.resolved_uri.hash(state);
    }
}

impl PartialOrd for Link {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Link {
    fn cmp(&self, other: &Self) -> Ordering {
        self.resolved_uri
            .cmp(&other.resolved_uri)
            .then_with(|| self.original_uri.cmp(&other.original_uri))
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.mapped_from {
            return write!(f, "{} mapped from {}", self.resolved_uri, source);
        }
        write!(f, "{} on [", self.short_display())?;
        for (i, path) in self.occurrences.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", path.display())?;
        }
        f.write_str("]")
    }
}
