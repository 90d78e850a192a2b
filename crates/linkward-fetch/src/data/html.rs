use std::collections::HashSet;

use parking_lot::Mutex;
use scraper::{ElementRef, Html, Selector};

use crate::error::FetchError;

/// An HTML body indexed for fragment lookups.
///
/// The body is parsed once. Element ids and `<a name>` anchors are indexed
/// up front; other selectors run against the kept DOM, which is only `Send`
/// and therefore sits behind a lock.
#[derive(Debug)]
pub struct HtmlDocument {
    dom: Mutex<Html>,
    ids: HashSet<String>,
    anchor_names: HashSet<String>,
}

impl HtmlDocument {
    pub fn parse(source: &str) -> Self {
        let html = Html::parse_document(source);

        let mut ids = HashSet::new();
        let mut anchor_names = HashSet::new();
        for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
            let element = element.value();
            if let Some(id) = element.id() {
                ids.insert(id.to_string());
            }
            if element.name() == "a"
                && let Some(name) = element.attr("name")
            {
                anchor_names.insert(name.to_string());
            }
        }

        Self {
            dom: Mutex::new(html),
            ids,
            anchor_names,
        }
    }

    /// Whether an element with the given `id` attribute exists.
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Whether an `<a name="...">` anchor with the given name exists.
    pub fn has_anchor_named(&self, name: &str) -> bool {
        self.anchor_names.contains(name)
    }

    /// Whether at least one element matches a CSS selector.
    ///
    /// Selectors of the form `#identifier` are answered from the id index,
    /// which also accepts ids that are not valid CSS identifiers
    /// (e.g. `#1-intro`).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Selector`] if `selector` cannot be parsed.
    pub fn select_any(&self, selector: &str) -> Result<bool, FetchError> {
        if let Some(id) = selector.strip_prefix('#').filter(|id| is_plain_id(id)) {
            return Ok(self.has_id(id));
        }

        let parsed = Selector::parse(selector).map_err(|e| FetchError::Selector {
            selector: selector.to_string(),
            reason: format!("{e:?}"),
        })?;
        let found = self.dom.lock().select(&parsed).next().is_some();
        Ok(found)
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii())
}
