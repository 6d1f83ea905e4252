#![forbid(unsafe_code)]

//! `ftui-tooltip` manages a tooltip overlay over a document-like host.
//!
//! Design goals:
//! - **Host-driven I/O**: the embedder pushes pointer events, fetch results
//!   and timer expiries; the tooltip answers with queued [`Effect`]s.
//! - **Deterministic**: no threads, no clocks, no network. Delays and
//!   fetches are requests to the host, matched back by ticket and id.
//! - **Stale-safe**: a late fetch or timer for a trigger the user already
//!   left never touches the overlay.
//!
//! The document is abstracted by [`Document`]; [`MemoryDocument`] is an
//! in-memory implementation for tests and headless hosts.
//!
//! # Configuration
//!
//! [`TooltipOptions`] holds instance defaults. Each trigger may override
//! them with `data-tooltip-*` attributes (see [`AttributeNames`]). With the
//! `config` feature, defaults load from TOML or JSON.

pub mod content;
pub mod document;
pub mod error;
pub mod event;
pub mod geometry;
pub mod interaction;
pub mod options;
pub mod overlay;
pub mod placement;
pub mod tooltip;

pub use content::{ContentCache, ContentSource, Payload};
pub use document::{Document, MemoryDocument, NodeId, TextMetrics};
pub use error::TooltipError;
pub use event::{
    Effect, FetchError, FetchRequest, HitTarget, PointerEvent, PointerEventKind, RequestId,
    RevealTicket, TooltipEvent,
};
pub use geometry::{Point, Rect, Size};
pub use interaction::{Action, IgnoredReason};
pub use options::{AttributeNames, Mode, OptionsError, TooltipOptions};
pub use overlay::{Overlay, Region, Template, TemplateError};
pub use placement::{AnchoredPositioner, Anchor, Placed, Placement, PlacementRequest, Positioner};
pub use tooltip::{ARIA_DESCRIBEDBY, NATIVE_TITLE, Phase, Tooltip};
