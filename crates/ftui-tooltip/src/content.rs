#![forbid(unsafe_code)]

//! Content sources and the per-instance content cache.
//!
//! A trigger's content string is one of:
//!
//! - a fragment reference (`#help-save`) naming an element in the document,
//!   resolved synchronously to that element's inner markup;
//! - a URL, when AJAX is enabled, fetched by the host and cached;
//! - literal markup otherwise.
//!
//! # Invariants
//!
//! 1. A fragment reference never produces a remote fetch, whatever the
//!    `ajax` option says.
//! 2. A fragment reference with no matching element is literal content.
//! 3. A cache key is written at most once; entries are never evicted for
//!    the life of the instance.

use std::sync::LazyLock;

use ahash::AHashMap;
use regex::Regex;

use crate::document::Document;

static FRAGMENT_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#([A-Za-z_][\w\-:.]*)$").expect("fragment reference pattern is valid")
});

/// Fragment id named by `content`, if it is a CSS id selector literal.
#[must_use]
pub fn fragment_id(content: &str) -> Option<&str> {
    FRAGMENT_REFERENCE
        .captures(content.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Where a show's content comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// In-document fragment, already resolved.
    Fragment { id: String, markup: String },
    /// Remote resource keyed by URL.
    Remote(String),
    /// Literal markup or text.
    Literal(String),
}

impl ContentSource {
    /// Classify a content string.
    pub fn classify<D: Document + ?Sized>(document: &D, content: &str, ajax: bool) -> Self {
        if let Some(id) = fragment_id(content) {
            return match document.element_by_id(id) {
                Some(node) => Self::Fragment {
                    id: id.to_string(),
                    markup: document.inner_markup(node).unwrap_or_default(),
                },
                None => Self::Literal(content.to_string()),
            };
        }
        if ajax {
            Self::Remote(content.trim().to_string())
        } else {
            Self::Literal(content.to_string())
        }
    }

    /// Whether this source needs the fetch path.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

/// Content handed to the presentation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A fetch is still in flight; presenting this is a no-op.
    Pending,
    /// Ready-to-render markup (possibly empty).
    Markup(String),
}

/// Resolved markup keyed by content source.
///
/// Growth is bounded by the number of distinct sources on the page.
#[derive(Debug, Clone, Default)]
pub struct ContentCache {
    entries: AHashMap<String, String>,
}

impl ContentCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached markup for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store markup for `key` unless it is already present.
    ///
    /// Returns `true` if the entry was inserted.
    pub fn insert(&mut self, key: &str, markup: String) -> bool {
        if self.entries.contains_key(key) {
            return false;
        }
        self.entries.insert(key.to_string(), markup);
        true
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn fragment_pattern() {
        assert_eq!(fragment_id("#fragment"), Some("fragment"));
        assert_eq!(fragment_id("  #help-save_2 "), Some("help-save_2"));
        assert_eq!(fragment_id("#1bad"), None);
        assert_eq!(fragment_id("#a b"), None);
        assert_eq!(fragment_id("/help#anchor"), None);
        assert_eq!(fragment_id("#"), None);
    }

    #[test]
    fn fragment_beats_ajax() {
        let mut doc = MemoryDocument::new();
        let frag = doc.create("div", None);
        doc.set_attribute(frag, "id", "fragment");
        doc.set_inner_markup(frag, "<b>Hi</b>");

        let source = ContentSource::classify(&doc, "#fragment", true);
        assert_eq!(
            source,
            ContentSource::Fragment {
                id: "fragment".into(),
                markup: "<b>Hi</b>".into()
            }
        );
        assert!(!source.is_remote());
    }

    #[test]
    fn missing_fragment_is_literal_even_with_ajax() {
        let doc = MemoryDocument::new();
        for ajax in [false, true] {
            assert_eq!(
                ContentSource::classify(&doc, "#nowhere", ajax),
                ContentSource::Literal("#nowhere".into())
            );
        }
    }

    #[test]
    fn ajax_selects_remote() {
        let doc = MemoryDocument::new();
        assert_eq!(
            ContentSource::classify(&doc, " /help/save.html ", true),
            ContentSource::Remote("/help/save.html".into())
        );
        assert_eq!(
            ContentSource::classify(&doc, "Hello", false),
            ContentSource::Literal("Hello".into())
        );
    }

    #[test]
    fn cache_first_write_wins() {
        let mut cache = ContentCache::new();
        assert!(cache.is_empty());
        assert!(cache.insert("/a", "one".into()));
        assert!(!cache.insert("/a", "two".into()));
        assert_eq!(cache.get("/a"), Some("one"));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("/a"));
        assert!(!cache.contains("/b"));
    }
}
