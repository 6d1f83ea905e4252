#![forbid(unsafe_code)]

//! Tooltip options and per-node override resolution.
//!
//! [`TooltipOptions`] holds instance defaults. Trigger nodes may override any
//! option except the template through `data-tooltip-*` attributes;
//! [`resolve`] overlays those onto the defaults to produce the runtime
//! options for one show. Resolution never fails: absent or unparsable
//! attributes fall through to the default.
//!
//! # Loading
//!
//! With the `config` feature, defaults can be loaded from TOML or JSON:
//!
//! ```toml
//! mode = "click"
//! position = "bottom-right"
//! x_offset = 12
//! delay_ms = 150
//! ```
//!
//! ```rust,ignore
//! let options = TooltipOptions::from_toml_file("tooltip.toml")?;
//! ```

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "config")]
use std::path::Path;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::document::{Document, NodeId};
use crate::overlay::Template;
use crate::placement::Placement;

/// Default namespace for tooltip attributes.
pub const DEFAULT_ATTRIBUTE_PREFIX: &str = "data-tooltip";

/// How the tooltip is triggered and dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Show on pointer enter, hide on pointer leave.
    #[default]
    Hover,
    /// Show on click, hide on a click outside trigger and overlay.
    Click,
}

impl Mode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hover => "hover",
            Self::Click => "click",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hover" => Ok(Self::Hover),
            "click" => Ok(Self::Click),
            other => Err(format!("unknown tooltip mode: {other:?}")),
        }
    }
}

/// Tooltip configuration.
///
/// Used both as instance defaults and, after [`resolve`], as the runtime
/// options of the current trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct TooltipOptions {
    /// Trigger/dismiss binding (default: hover).
    pub mode: Mode,
    /// Placement keyword (default: top).
    pub position: Placement,
    /// Horizontal pixel adjustment.
    pub x_offset: i32,
    /// Vertical pixel adjustment.
    pub y_offset: i32,
    /// Treat non-fragment content as a URL to fetch.
    pub ajax: bool,
    /// Track the pointer instead of anchoring to the trigger.
    pub follow: bool,
    /// Show the `loading` placeholder while a fetch is in flight.
    pub show_loading: bool,
    /// Render the title region.
    pub show_title: bool,
    /// Milliseconds before reveal in fixed mode (default: 0).
    pub delay_ms: u64,
    /// Attribute holding the title.
    pub get_title: String,
    /// Attribute holding the content source.
    pub get_content: String,
    /// Extra class applied to the overlay while shown.
    pub class_name: String,
    /// Transition class applied to the overlay while shown (default: `fade`).
    pub animation: String,
    /// Minimum milliseconds between follow-mode repositions (default: 50).
    pub mouse_throttle_ms: u64,
    /// Placeholder markup shown while loading.
    pub loading: String,
    /// Overlay skeleton. Instance-wide; not overridable per node.
    pub template: Template,
    /// Namespace for per-node override attributes.
    pub attribute_prefix: String,
    /// Flip to the opposite side when the overlay would leave the viewport.
    pub flip: bool,
}

impl Default for TooltipOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Hover,
            position: Placement::Top,
            x_offset: 0,
            y_offset: 0,
            ajax: false,
            follow: false,
            show_loading: true,
            show_title: true,
            delay_ms: 0,
            get_title: format!("{DEFAULT_ATTRIBUTE_PREFIX}-title"),
            get_content: DEFAULT_ATTRIBUTE_PREFIX.to_string(),
            class_name: String::new(),
            animation: "fade".to_string(),
            mouse_throttle_ms: 50,
            loading: "Loading...".to_string(),
            template: Template::default(),
            attribute_prefix: DEFAULT_ATTRIBUTE_PREFIX.to_string(),
            flip: true,
        }
    }
}

impl TooltipOptions {
    /// Reveal delay as a [`Duration`].
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Follow-mode throttle interval as a [`Duration`].
    #[must_use]
    pub fn mouse_throttle(&self) -> Duration {
        Duration::from_millis(self.mouse_throttle_ms)
    }

    #[must_use]
    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn position(mut self, position: Placement) -> Self {
        self.position = position;
        self
    }

    /// Set both pixel offsets.
    #[must_use]
    pub fn offset(mut self, x: i32, y: i32) -> Self {
        self.x_offset = x;
        self.y_offset = y;
        self
    }

    #[must_use]
    pub fn ajax(mut self, ajax: bool) -> Self {
        self.ajax = ajax;
        self
    }

    #[must_use]
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    #[must_use]
    pub fn show_loading(mut self, show: bool) -> Self {
        self.show_loading = show;
        self
    }

    #[must_use]
    pub fn show_title(mut self, show: bool) -> Self {
        self.show_title = show;
        self
    }

    #[must_use]
    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    #[must_use]
    pub fn get_title(mut self, attribute: impl Into<String>) -> Self {
        self.get_title = attribute.into();
        self
    }

    #[must_use]
    pub fn get_content(mut self, attribute: impl Into<String>) -> Self {
        self.get_content = attribute.into();
        self
    }

    #[must_use]
    pub fn class_name(mut self, class: impl Into<String>) -> Self {
        self.class_name = class.into();
        self
    }

    /// Transition class; empty disables it.
    #[must_use]
    pub fn animation(mut self, class: impl Into<String>) -> Self {
        self.animation = class.into();
        self
    }

    /// Minimum interval between follow repositions; 0 disables throttling.
    #[must_use]
    pub fn mouse_throttle_ms(mut self, ms: u64) -> Self {
        self.mouse_throttle_ms = ms;
        self
    }

    #[must_use]
    pub fn loading(mut self, markup: impl Into<String>) -> Self {
        self.loading = markup.into();
        self
    }

    #[must_use]
    pub fn template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn attribute_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.attribute_prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    /// Load from a TOML string.
    #[cfg(feature = "config")]
    pub fn from_toml_str(s: &str) -> Result<Self, OptionsError> {
        toml::from_str(s).map_err(OptionsError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(OptionsError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string.
    #[cfg(feature = "config")]
    pub fn from_json_str(s: &str) -> Result<Self, OptionsError> {
        serde_json::from_str(s).map_err(OptionsError::Json)
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, OptionsError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(OptionsError::Io)?;
        Self::from_json_str(&content)
    }

    /// Validate option values.
    ///
    /// Returns a list of problems; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !is_attribute_name(&self.attribute_prefix) {
            errors.push(format!(
                "attribute_prefix must be a non-empty attribute name, got {:?}",
                self.attribute_prefix
            ));
        }
        if !is_attribute_name(&self.get_content) {
            errors.push(format!(
                "get_content must be a non-empty attribute name, got {:?}",
                self.get_content
            ));
        }
        if !is_attribute_name(&self.get_title) {
            errors.push(format!(
                "get_title must be a non-empty attribute name, got {:?}",
                self.get_title
            ));
        }
        errors
    }
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c.is_whitespace() || c == '=' || c == '"')
}

/// Attribute names derived from an instance's prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeNames {
    pub mode: String,
    pub position: String,
    pub x_offset: String,
    pub y_offset: String,
    pub ajax: String,
    pub follow: String,
    pub show_loading: String,
    pub show_title: String,
    pub delay: String,
    pub class_name: String,
    pub animation: String,
    pub mouse_throttle: String,
    pub get_title: String,
    pub get_content: String,
    pub loading: String,
    /// Private home of a migrated native `title` attribute.
    pub native_title: String,
}

impl AttributeNames {
    #[must_use]
    pub fn new(prefix: &str) -> Self {
        let name = |suffix: &str| format!("{prefix}-{suffix}");
        Self {
            mode: name("mode"),
            position: name("position"),
            x_offset: name("x-offset"),
            y_offset: name("y-offset"),
            ajax: name("ajax"),
            follow: name("follow"),
            show_loading: name("show-loading"),
            show_title: name("show-title"),
            delay: name("delay"),
            class_name: name("class"),
            animation: name("animation"),
            mouse_throttle: name("mouse-throttle"),
            get_title: name("get-title"),
            get_content: name("get-content"),
            loading: name("loading"),
            native_title: name("native-title"),
        }
    }
}

impl Default for AttributeNames {
    fn default() -> Self {
        Self::new(DEFAULT_ATTRIBUTE_PREFIX)
    }
}

/// Overlay a node's attribute overrides onto `defaults`.
///
/// `defaults` is never mutated; the result is a fresh value.
pub fn resolve<D: Document + ?Sized>(
    defaults: &TooltipOptions,
    names: &AttributeNames,
    document: &D,
    node: NodeId,
) -> TooltipOptions {
    let mut out = defaults.clone();
    let read = |name: &str| document.attribute(node, name);

    override_parsed(&mut out.mode, read(&names.mode), &names.mode, |v| v.parse().ok());
    override_parsed(&mut out.position, read(&names.position), &names.position, |v| {
        v.parse().ok()
    });
    override_parsed(&mut out.x_offset, read(&names.x_offset), &names.x_offset, parse_px);
    override_parsed(&mut out.y_offset, read(&names.y_offset), &names.y_offset, parse_px);
    override_parsed(&mut out.ajax, read(&names.ajax), &names.ajax, parse_flag);
    override_parsed(&mut out.follow, read(&names.follow), &names.follow, parse_flag);
    override_parsed(
        &mut out.show_loading,
        read(&names.show_loading),
        &names.show_loading,
        parse_flag,
    );
    override_parsed(
        &mut out.show_title,
        read(&names.show_title),
        &names.show_title,
        parse_flag,
    );
    override_parsed(&mut out.delay_ms, read(&names.delay), &names.delay, parse_ms);
    override_parsed(&mut out.class_name, read(&names.class_name), &names.class_name, |v| {
        Some(v.to_string())
    });
    override_parsed(&mut out.animation, read(&names.animation), &names.animation, |v| {
        Some(v.trim().to_string())
    });
    override_parsed(
        &mut out.mouse_throttle_ms,
        read(&names.mouse_throttle),
        &names.mouse_throttle,
        parse_ms,
    );
    override_parsed(&mut out.get_title, read(&names.get_title), &names.get_title, non_empty);
    override_parsed(
        &mut out.get_content,
        read(&names.get_content),
        &names.get_content,
        non_empty,
    );
    override_parsed(&mut out.loading, read(&names.loading), &names.loading, |v| {
        Some(v.to_string())
    });
    out
}

/// Only the mode of a node; used to route pointer events cheaply.
pub fn resolve_mode<D: Document + ?Sized>(
    defaults: &TooltipOptions,
    names: &AttributeNames,
    document: &D,
    node: NodeId,
) -> Mode {
    let mut mode = defaults.mode;
    override_parsed(&mut mode, document.attribute(node, &names.mode), &names.mode, |v| {
        v.parse().ok()
    });
    mode
}

fn override_parsed<T>(
    slot: &mut T,
    raw: Option<String>,
    attribute: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) {
    let Some(raw) = raw else {
        return;
    };
    match parse(&raw) {
        Some(value) => *slot = value,
        None => tracing::debug!(
            target: "ftui.tooltip",
            attribute,
            value = %raw,
            "ignoring unparsable option override"
        ),
    }
}

fn parse_ms(value: &str) -> Option<u64> {
    value.trim().trim_end_matches("ms").trim().parse().ok()
}

fn parse_px(value: &str) -> Option<i32> {
    value.trim().trim_end_matches("px").trim().parse().ok()
}

/// Boolean attribute: a bare attribute (`data-tooltip-ajax=""`) is true.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Errors that can occur when building or loading options.
#[derive(Debug)]
pub enum OptionsError {
    /// I/O error reading a file.
    #[cfg(feature = "config")]
    Io(std::io::Error),
    /// TOML parse error.
    #[cfg(feature = "config")]
    Toml(toml::de::Error),
    /// JSON parse error.
    #[cfg(feature = "config")]
    Json(serde_json::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "config")]
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for OptionsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            #[cfg(feature = "config")]
            Self::Io(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}
