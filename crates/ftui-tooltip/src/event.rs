#![forbid(unsafe_code)]

//! Inputs the host pushes into a tooltip and effects it gets back.
//!
//! Pointer input arrives as [`PointerEvent`]. Everything the tooltip wants
//! the outside world to do or know is queued as an [`Effect`], drained in
//! order with [`Tooltip::drain_effects`](crate::Tooltip::drain_effects).

use core::fmt;

use web_time::Duration;

use crate::document::NodeId;
use crate::geometry::Point;

/// Identifies one outstanding fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request:{}", self.0)
    }
}

/// Identifies one scheduled reveal. Stale tickets are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RevealTicket(pub u64);

/// A fetch the host should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub id: RequestId,
    pub url: String,
    /// Trigger that caused the fetch.
    pub node: NodeId,
}

/// Failure reported by the host's fetch transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status.
    Status(u16),
    /// The request never completed (network, CORS, abort, ...).
    Transport(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP status {code}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Lifecycle notification for observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TooltipEvent {
    /// Content resolved; about to render.
    Showing { node: NodeId },
    /// Content rendered into the overlay, not yet revealed.
    Load { node: NodeId, content: String },
    /// Overlay revealed.
    Shown { node: NodeId },
    /// About to reset and conceal.
    Hiding { node: Option<NodeId> },
    /// Overlay concealed.
    Hidden { node: Option<NodeId> },
    /// A fetch failed; nothing was cached.
    FetchFailed { url: String, error: FetchError },
}

impl TooltipEvent {
    /// Short lowercase name, as used by DOM-style listeners.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Showing { .. } => "showing",
            Self::Load { .. } => "load",
            Self::Shown { .. } => "shown",
            Self::Hiding { .. } => "hiding",
            Self::Hidden { .. } => "hidden",
            Self::FetchFailed { .. } => "fetch-failed",
        }
    }
}

/// Work queued for the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver a lifecycle notification.
    Notify(TooltipEvent),
    /// Fetch `url`, then call [`Tooltip::complete_fetch`](crate::Tooltip::complete_fetch).
    Fetch(FetchRequest),
    /// After `delay`, call [`Tooltip::reveal_elapsed`](crate::Tooltip::reveal_elapsed).
    ScheduleReveal { ticket: RevealTicket, delay: Duration },
}

impl Effect {
    /// The notification, if this effect is one.
    #[must_use]
    pub fn as_event(&self) -> Option<&TooltipEvent> {
        match self {
            Self::Notify(event) => Some(event),
            _ => None,
        }
    }
}

/// What a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// A document element.
    Node(NodeId),
    /// The tooltip overlay itself.
    Overlay,
    /// Nothing the host can name (outside the document, a scrollbar, ...).
    Nothing,
}

impl HitTarget {
    #[must_use]
    pub const fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }
}

/// Pointer event kinds the interaction controller understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEventKind {
    /// Pointer entered `target`.
    Enter,
    /// Pointer left `target` for `related`.
    Leave { related: HitTarget },
    /// Pointer moved over `target`.
    Move,
    /// Primary click on `target`.
    Click,
}

/// A pointer event in document pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub target: HitTarget,
    pub position: Point,
    /// Host monotonic time of the event. Without it follow-mode moves are
    /// never throttled.
    pub timestamp: Option<Duration>,
}

impl PointerEvent {
    /// Create a new pointer event.
    #[must_use]
    pub const fn new(kind: PointerEventKind, target: HitTarget, x: i32, y: i32) -> Self {
        Self {
            kind,
            target,
            position: Point::new(x, y),
            timestamp: None,
        }
    }

    /// Stamp the event with the host's monotonic time.
    #[must_use]
    pub const fn at(self, timestamp: Duration) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..self
        }
    }

    #[must_use]
    pub const fn enter(node: NodeId, x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Enter, HitTarget::Node(node), x, y)
    }

    #[must_use]
    pub const fn leave(node: NodeId, related: HitTarget, x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Leave { related }, HitTarget::Node(node), x, y)
    }

    #[must_use]
    pub const fn moved(target: HitTarget, x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Move, target, x, y)
    }

    #[must_use]
    pub const fn click(target: HitTarget, x: i32, y: i32) -> Self {
        Self::new(PointerEventKind::Click, target, x, y)
    }
}
