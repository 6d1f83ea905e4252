#![forbid(unsafe_code)]

//! The overlay element: template skeleton, head/body regions, classes,
//! visibility and position.
//!
//! The overlay is plain data. Hosts paint it however they like: read the
//! regions and classes directly, or call [`Overlay::markup`] for an HTML
//! rendering of the template.

use core::fmt;

use crate::geometry::Point;

/// Insertion point for the title region.
pub const HEAD_SLOT: &str = "{{head}}";
/// Insertion point for the content region.
pub const BODY_SLOT: &str = "{{body}}";

/// Default overlay skeleton.
pub const DEFAULT_TEMPLATE: &str = concat!(
    r#"<div class="tooltip" role="tooltip">"#,
    r#"<div class="tooltip-head">{{head}}</div>"#,
    r#"<div class="tooltip-body">{{body}}</div>"#,
    "</div>"
);

/// Why a template was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateError {
    /// No `{{head}}` insertion point.
    MissingHead,
    /// No `{{body}}` insertion point.
    MissingBody,
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHead => write!(f, "template has no {HEAD_SLOT} insertion point"),
            Self::MissingBody => write!(f, "template has no {BODY_SLOT} insertion point"),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Overlay markup skeleton with validated insertion points.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(try_from = "String", into = "String"))]
pub struct Template {
    source: String,
}

impl Template {
    /// Validate and wrap a template string.
    pub fn parse(source: impl Into<String>) -> Result<Self, TemplateError> {
        let source = source.into();
        if !source.contains(HEAD_SLOT) {
            return Err(TemplateError::MissingHead);
        }
        if !source.contains(BODY_SLOT) {
            return Err(TemplateError::MissingBody);
        }
        Ok(Self { source })
    }

    /// The raw template string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute region markup into the insertion points.
    ///
    /// Single pass over the template: inserted markup is never scanned for
    /// slots itself.
    #[must_use]
    pub fn render(&self, head: &str, body: &str) -> String {
        let mut out = String::with_capacity(self.source.len() + head.len() + body.len());
        let mut rest = self.source.as_str();
        loop {
            let next = [(HEAD_SLOT, head), (BODY_SLOT, body)]
                .into_iter()
                .filter_map(|(slot, value)| rest.find(slot).map(|at| (at, slot, value)))
                .min_by_key(|&(at, ..)| at);
            let Some((at, slot, value)) = next else {
                break;
            };
            out.push_str(&rest[..at]);
            out.push_str(value);
            rest = &rest[at + slot.len()..];
        }
        out.push_str(rest);
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl TryFrom<String> for Template {
    type Error = TemplateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Template> for String {
    fn from(value: Template) -> Self {
        value.source
    }
}

/// One sub-region of the overlay (head or body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    markup: String,
    visible: bool,
}

impl Region {
    /// Current markup (kept even while hidden).
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn show(&mut self, markup: &str) {
        markup.clone_into(&mut self.markup);
        self.visible = true;
    }

    fn hide(&mut self) {
        self.markup.clear();
        self.visible = false;
    }
}

/// The tooltip overlay owned by one [`Tooltip`](crate::Tooltip) instance.
#[derive(Debug, Clone)]
pub struct Overlay {
    id: String,
    template: Template,
    head: Region,
    body: Region,
    classes: Vec<String>,
    visible: bool,
    origin: Option<Point>,
}

impl Overlay {
    /// Create a concealed overlay from a template.
    #[must_use]
    pub fn new(id: impl Into<String>, template: Template) -> Self {
        Self {
            id: id.into(),
            template,
            head: Region::default(),
            body: Region::default(),
            classes: Vec::new(),
            visible: false,
            origin: None,
        }
    }

    /// Element id, referenced by `aria-describedby` on the trigger.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn template(&self) -> &Template {
        &self.template
    }

    /// Title region.
    #[must_use]
    pub fn head(&self) -> &Region {
        &self.head
    }

    /// Content region.
    #[must_use]
    pub fn body(&self) -> &Region {
        &self.body
    }

    /// Classes applied on top of the template's own.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Top-left corner from the last placement, if any.
    #[must_use]
    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    /// Render the template with the current region contents.
    ///
    /// Hidden regions render empty.
    #[must_use]
    pub fn markup(&self) -> String {
        self.template.render(
            if self.head.visible { &self.head.markup } else { "" },
            if self.body.visible { &self.body.markup } else { "" },
        )
    }

    pub(crate) fn add_class(&mut self, class: &str) {
        for class in class.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        }
    }

    /// Returns `true` if anything was removed.
    pub(crate) fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        for class in class.split_whitespace() {
            self.classes.retain(|c| c != class);
        }
        self.classes.len() != before
    }

    pub(crate) fn set_head(&mut self, markup: Option<&str>) {
        match markup {
            Some(markup) if !markup.is_empty() => self.head.show(markup),
            _ => self.head.hide(),
        }
    }

    pub(crate) fn set_body(&mut self, markup: &str) {
        if markup.is_empty() {
            self.body.hide();
        } else {
            self.body.show(markup);
        }
    }

    pub(crate) fn move_to(&mut self, origin: Point) {
        self.origin = Some(origin);
    }

    pub(crate) fn reveal(&mut self) {
        self.visible = true;
    }

    pub(crate) fn conceal(&mut self) {
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn template_requires_both_slots() {
        assert_eq!(
            Template::parse("<div>{{body}}</div>"),
            Err(TemplateError::MissingHead)
        );
        assert_eq!(
            Template::parse("<div>{{head}}</div>"),
            Err(TemplateError::MissingBody)
        );
        assert!(Template::parse("<i>{{head}}</i><p>{{body}}</p>").is_ok());
    }

    #[test]
    fn markup_skips_hidden_regions() {
        let template = Template::parse("<h>{{head}}</h><b>{{body}}</b>").unwrap();
        let mut overlay = Overlay::new("tooltip-1", template);
        overlay.set_head(None);
        overlay.set_body("Hello");
        assert_eq!(overlay.markup(), "<h></h><b>Hello</b>");
        assert!(!overlay.head().is_visible());
        assert!(overlay.body().is_visible());

        overlay.set_head(Some("Title"));
        overlay.set_body("");
        assert_eq!(overlay.markup(), "<h>Title</h><b></b>");
        assert!(!overlay.body().is_visible());
    }

    #[test]
    fn slot_text_inside_region_markup_is_left_alone() {
        let template = Template::parse("<h>{{head}}</h><b>{{body}}</b>").unwrap();
        assert_eq!(
            template.render("see {{body}}", "BODY"),
            "<h>see {{body}}</h><b>BODY</b>"
        );
        assert_eq!(
            template.render("T", "uses {{head}}"),
            "<h>T</h><b>uses {{head}}</b>"
        );
    }

    #[test]
    fn repeated_slots_all_render() {
        let template = Template::parse("{{body}}|{{head}}|{{body}}").unwrap();
        assert_eq!(template.render("H", "B"), "B|H|B");
    }

    #[test]
    fn classes_do_not_duplicate() {
        let mut overlay = Overlay::new("t", Template::default());
        overlay.add_class("tooltip-top dark");
        overlay.add_class("dark");
        assert_eq!(overlay.classes(), ["tooltip-top", "dark"]);
        assert!(overlay.remove_class("dark"));
        assert!(!overlay.remove_class("dark"));
        assert_eq!(overlay.classes(), ["tooltip-top"]);
    }

    #[test]
    fn reveal_and_conceal_toggle_visibility() {
        let mut overlay = Overlay::new("t", Template::default());
        assert!(!overlay.is_visible());
        overlay.reveal();
        assert!(overlay.is_visible());
        overlay.conceal();
        assert!(!overlay.is_visible());
    }
}
