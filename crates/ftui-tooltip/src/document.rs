#![forbid(unsafe_code)]

//! Document access consumed by the tooltip.
//!
//! The tooltip never owns trigger elements. It reads and writes them through
//! the [`Document`] trait, which a host implements over its real element
//! tree (a browser DOM via JS glue, a widget tree, ...).
//!
//! [`MemoryDocument`] is a small in-memory implementation for tests and
//! headless hosts. It supports compound selectors made of a tag, `#id`,
//! `.class`, `[attr]` and `[attr=value]` parts, and comma-separated lists.
//! Combinators are not supported; a selector containing whitespace inside a
//! compound never matches.

use core::fmt;

use unicode_width::UnicodeWidthStr;

use crate::geometry::{Rect, Size};
use crate::overlay::Overlay;

/// Handle to an element in a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// Element tree operations the tooltip relies on.
pub trait Document {
    /// Attribute value, if present.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Remove an attribute, returning its previous value.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Whether `node` matches a CSS-style selector.
    fn matches(&self, node: NodeId, selector: &str) -> bool;

    /// All elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<NodeId>;

    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Inner markup of an element (fragment references resolve to this).
    fn inner_markup(&self, node: NodeId) -> Option<String>;

    /// Bounding box in document pixels.
    fn bounding_rect(&self, node: NodeId) -> Option<Rect>;

    /// Visible area used to flip and clamp placement. `None` disables both.
    fn viewport(&self) -> Option<Rect>;

    /// Rendered size of the overlay with its current contents.
    fn measure(&self, overlay: &Overlay) -> Size;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    parent: Option<NodeId>,
    attributes: Vec<(String, String)>,
    rect: Option<Rect>,
    inner_markup: String,
}

impl Element {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// Text metrics used by [`MemoryDocument::measure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    /// Pixels per terminal-width column.
    pub char_width: i32,
    pub line_height: i32,
    /// Padding on each side of the overlay.
    pub padding: i32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 8,
            line_height: 16,
            padding: 6,
        }
    }
}

/// In-memory [`Document`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    elements: Vec<Element>,
    viewport: Option<Rect>,
    metrics: TextMetrics,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Create an empty document with a 1280×800 viewport.
    #[must_use]
    pub fn new() -> Self {
        Self {
            elements: Vec::new(),
            viewport: Some(Rect::from_size(1280, 800)),
            metrics: TextMetrics::default(),
        }
    }

    /// Append an element under `parent` (or at the top level).
    pub fn create(&mut self, tag: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.elements.len() as u32);
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            parent,
            attributes: Vec::new(),
            rect: None,
            inner_markup: String::new(),
        });
        id
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(element) = self.element_mut(node) {
            element.rect = Some(rect);
        }
    }

    pub fn set_inner_markup(&mut self, node: NodeId, markup: &str) {
        if let Some(element) = self.element_mut(node) {
            markup.clone_into(&mut element.inner_markup);
        }
    }

    pub fn set_viewport(&mut self, viewport: Option<Rect>) {
        self.viewport = viewport;
    }

    pub fn set_metrics(&mut self, metrics: TextMetrics) {
        self.metrics = metrics;
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn element(&self, node: NodeId) -> Option<&Element> {
        self.elements.get(node.0 as usize)
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        self.elements.get_mut(node.0 as usize)
    }
}

impl Document for MemoryDocument {
    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node)?.attribute(name).map(str::to_string)
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        let Some(element) = self.element_mut(node) else {
            return;
        };
        match element.attributes.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => value.clone_into(existing),
            None => element.attributes.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Option<String> {
        let element = self.element_mut(node)?;
        let index = element.attributes.iter().position(|(key, _)| key == name)?;
        Some(element.attributes.remove(index).1)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.element(node)?.parent
    }

    fn matches(&self, node: NodeId, selector: &str) -> bool {
        let Some(element) = self.element(node) else {
            return false;
        };
        selector
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .any(|compound| compound_matches(element, compound))
    }

    fn query_all(&self, selector: &str) -> Vec<NodeId> {
        (0..self.elements.len() as u32)
            .map(NodeId)
            .filter(|&node| self.matches(node, selector))
            .collect()
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements
            .iter()
            .position(|element| element.attribute("id") == Some(id))
            .map(|index| NodeId(index as u32))
    }

    fn inner_markup(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|element| element.inner_markup.clone())
    }

    fn bounding_rect(&self, node: NodeId) -> Option<Rect> {
        self.element(node)?.rect
    }

    fn viewport(&self) -> Option<Rect> {
        self.viewport
    }

    fn measure(&self, overlay: &Overlay) -> Size {
        let mut columns = 0usize;
        let mut lines = 0usize;
        for region in [overlay.head(), overlay.body()] {
            if !region.is_visible() {
                continue;
            }
            for line in strip_tags(region.markup()).lines() {
                columns = columns.max(line.width());
                lines += 1;
            }
        }
        let m = self.metrics;
        let pad = m.padding.saturating_mul(2);
        Size::new(
            (columns as i32).saturating_mul(m.char_width).saturating_add(pad),
            (lines as i32).saturating_mul(m.line_height).saturating_add(pad),
        )
    }
}

/// Drop `<...>` tags, keeping text content.
fn strip_tags(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut in_tag = false;
    for ch in markup.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

fn compound_matches(element: &Element, compound: &str) -> bool {
    if compound.contains(char::is_whitespace) {
        return false;
    }
    let mut rest = compound;

    // Leading tag (or `*`).
    let tag_end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
    let tag = &rest[..tag_end];
    if !tag.is_empty() && tag != "*" && !tag.eq_ignore_ascii_case(&element.tag) {
        return false;
    }
    rest = &rest[tag_end..];

    while let Some(marker) = rest.chars().next() {
        rest = &rest[1..];
        match marker {
            '#' | '.' => {
                let end = rest.find(['#', '.', '[']).unwrap_or(rest.len());
                let name = &rest[..end];
                rest = &rest[end..];
                let ok = if marker == '#' {
                    element.attribute("id") == Some(name)
                } else {
                    element.has_class(name)
                };
                if name.is_empty() || !ok {
                    return false;
                }
            }
            '[' => {
                let Some(end) = rest.find(']') else {
                    return false;
                };
                let body = &rest[..end];
                rest = &rest[end + 1..];
                let ok = match body.split_once('=') {
                    Some((name, value)) => {
                        let value = value.trim_matches(|c| c == '"' || c == '\'');
                        element.attribute(name) == Some(value)
                    }
                    None => element.attribute(body).is_some(),
                };
                if !ok {
                    return false;
                }
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::Template;
    use pretty_assertions::assert_eq;

    fn fixture() -> (MemoryDocument, NodeId, NodeId, NodeId) {
        let mut doc = MemoryDocument::new();
        let body = doc.create("body", None);
        let link = doc.create("a", Some(body));
        let icon = doc.create("span", Some(link));
        doc.set_attribute(link, "class", "tip help");
        doc.set_attribute(link, "id", "save");
        doc.set_attribute(link, "data-tooltip", "Save");
        (doc, body, link, icon)
    }

    #[test]
    fn attributes_set_replace_remove() {
        let (mut doc, _, link, _) = fixture();
        assert_eq!(doc.attribute(link, "data-tooltip").as_deref(), Some("Save"));
        doc.set_attribute(link, "data-tooltip", "Save file");
        assert_eq!(doc.attribute(link, "data-tooltip").as_deref(), Some("Save file"));
        assert_eq!(doc.remove_attribute(link, "data-tooltip").as_deref(), Some("Save file"));
        assert_eq!(doc.remove_attribute(link, "data-tooltip"), None);
        assert!(!doc.has_attribute(link, "data-tooltip"));
    }

    #[test]
    fn selectors_match_compounds_and_lists() {
        let (doc, body, link, icon) = fixture();
        assert!(doc.matches(link, "a"));
        assert!(doc.matches(link, ".tip"));
        assert!(doc.matches(link, "a.tip.help"));
        assert!(doc.matches(link, "#save"));
        assert!(doc.matches(link, "[data-tooltip]"));
        assert!(doc.matches(link, "[data-tooltip=Save]"));
        assert!(doc.matches(link, "[data-tooltip=\"Save\"]"));
        assert!(!doc.matches(link, "[data-tooltip=Open]"));
        assert!(!doc.matches(link, "a.missing"));
        assert!(!doc.matches(link, "body a"));
        assert!(doc.matches(icon, "em, span"));
        assert_eq!(doc.query_all("[data-tooltip], body"), vec![body, link]);
    }

    #[test]
    fn contains_walks_ancestors() {
        let (doc, body, link, icon) = fixture();
        assert!(doc.contains(link, icon));
        assert!(doc.contains(body, icon));
        assert!(doc.contains(link, link));
        assert!(!doc.contains(icon, link));
    }

    #[test]
    fn element_by_id_and_inner_markup() {
        let (mut doc, _, link, _) = fixture();
        doc.set_inner_markup(link, "<b>Hi</b>");
        assert_eq!(doc.element_by_id("save"), Some(link));
        assert_eq!(doc.element_by_id("nope"), None);
        assert_eq!(doc.inner_markup(link).as_deref(), Some("<b>Hi</b>"));
    }

    #[test]
    fn measure_uses_visible_text_width() {
        let doc = MemoryDocument::new();
        let mut overlay = Overlay::new("t", Template::default());
        overlay.set_head(Some("Title"));
        overlay.set_body("<b>Hello</b> world\nsecond");
        // 11 columns * 8 + 12 padding, 3 lines * 16 + 12 padding
        assert_eq!(doc.measure(&overlay), Size::new(100, 60));
    }

    #[test]
    fn unknown_nodes_are_inert() {
        let mut doc = MemoryDocument::new();
        let ghost = NodeId(42);
        doc.set_attribute(ghost, "x", "y");
        assert_eq!(doc.attribute(ghost, "x"), None);
        assert!(!doc.matches(ghost, "*"));
        assert_eq!(doc.parent(ghost), None);
    }
}
