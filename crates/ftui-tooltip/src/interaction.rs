#![forbid(unsafe_code)]

//! Pointer interaction: which events show, hide or move the tooltip.
//!
//! [`decide`] maps one [`PointerEvent`] to an [`Action`] without touching the
//! tooltip. It enforces:
//! - delegation: the event target is walked up to the nearest managed
//!   trigger, so children of a trigger act on their trigger;
//! - per-node modes: a node's resolved [`Mode`] decides which events it
//!   answers to;
//! - outside dismissal in click mode: only clicks outside both the current
//!   trigger and the overlay hide.

use ahash::AHashSet;

use crate::document::{Document, NodeId};
use crate::event::{HitTarget, PointerEvent, PointerEventKind};
use crate::geometry::Point;
use crate::options::Mode;

/// Event that shows a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowTrigger {
    PointerEnter,
    Click,
}

/// How a shown tooltip is dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    /// Pointer leaves the trigger's region.
    PointerLeave,
    /// Click outside the trigger and the overlay.
    OutsideClick,
}

/// Event wiring for one mode, for hosts that attach listeners selectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub show: ShowTrigger,
    pub dismiss: Dismissal,
    /// Whether clicking the shown trigger again hides it.
    pub toggles: bool,
}

impl Bindings {
    #[must_use]
    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Hover => Self {
                show: ShowTrigger::PointerEnter,
                dismiss: Dismissal::PointerLeave,
                toggles: false,
            },
            Mode::Click => Self {
                show: ShowTrigger::Click,
                dismiss: Dismissal::OutsideClick,
                toggles: true,
            },
        }
    }
}

/// Deterministic reason why a pointer event changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// Target is not inside a managed trigger.
    NotATrigger,
    /// The trigger's mode doesn't answer to this event.
    ModeMismatch,
    /// Trigger is already the current one.
    AlreadyCurrent,
    /// Pointer stayed within the current trigger.
    InsideTrigger,
    /// Click landed on the overlay.
    InsideOverlay,
    /// Move while no follow tracking is bound.
    NotFollowing,
    /// Follow move arrived within the throttle interval of the last one.
    Throttled,
    /// Dismissal event with no tooltip active.
    NothingActive,
}

/// What the tooltip should do in response to a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Show(NodeId),
    Hide,
    /// Reposition a following overlay at the pointer.
    Follow(Point),
    Ignore(IgnoredReason),
}

/// Tooltip state the controller needs to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionState {
    /// Current trigger, shown or still loading.
    pub current: Option<NodeId>,
    /// Resolved mode of the current trigger.
    pub current_mode: Mode,
    /// Trigger with pointer-move tracking bound.
    pub following: Option<NodeId>,
}

/// Nearest managed trigger at or above `target`.
pub fn resolve_trigger<D: Document + ?Sized>(
    document: &D,
    triggers: &AHashSet<NodeId>,
    target: HitTarget,
) -> Option<NodeId> {
    let mut cursor = target.node();
    while let Some(node) = cursor {
        if triggers.contains(&node) {
            return Some(node);
        }
        cursor = document.parent(node);
    }
    None
}

/// Whether `target` is outside both `trigger` and the overlay.
pub fn is_outside<D: Document + ?Sized>(document: &D, trigger: NodeId, target: HitTarget) -> bool {
    match target {
        HitTarget::Overlay => false,
        HitTarget::Node(node) => !document.contains(trigger, node),
        HitTarget::Nothing => true,
    }
}

/// Decide the action for one pointer event.
///
/// `mode_of` resolves a trigger's effective mode (defaults plus its
/// override attribute).
pub fn decide<D: Document + ?Sized>(
    document: &D,
    triggers: &AHashSet<NodeId>,
    state: &InteractionState,
    mode_of: impl Fn(NodeId) -> Mode,
    event: &PointerEvent,
) -> Action {
    match event.kind {
        PointerEventKind::Move => match (state.following, event.target) {
            (Some(follow), HitTarget::Node(node)) if document.contains(follow, node) => {
                Action::Follow(event.position)
            }
            _ => Action::Ignore(IgnoredReason::NotFollowing),
        },
        PointerEventKind::Enter => {
            let Some(trigger) = resolve_trigger(document, triggers, event.target) else {
                return Action::Ignore(IgnoredReason::NotATrigger);
            };
            if mode_of(trigger) != Mode::Hover {
                return Action::Ignore(IgnoredReason::ModeMismatch);
            }
            if state.current == Some(trigger) {
                return Action::Ignore(IgnoredReason::AlreadyCurrent);
            }
            Action::Show(trigger)
        }
        PointerEventKind::Leave { related } => {
            let Some(current) = state.current else {
                return Action::Ignore(IgnoredReason::NothingActive);
            };
            if resolve_trigger(document, triggers, event.target) != Some(current) {
                return Action::Ignore(IgnoredReason::NotATrigger);
            }
            if state.current_mode != Mode::Hover {
                return Action::Ignore(IgnoredReason::ModeMismatch);
            }
            if let HitTarget::Node(node) = related
                && document.contains(current, node)
            {
                return Action::Ignore(IgnoredReason::InsideTrigger);
            }
            Action::Hide
        }
        PointerEventKind::Click => {
            let trigger = resolve_trigger(document, triggers, event.target);
            if let Some(trigger) = trigger
                && mode_of(trigger) == Mode::Click
            {
                let bindings = Bindings::for_mode(Mode::Click);
                if state.current == Some(trigger) && bindings.toggles {
                    return Action::Hide;
                }
                return Action::Show(trigger);
            }
            let Some(current) = state.current else {
                return Action::Ignore(IgnoredReason::NothingActive);
            };
            if state.current_mode != Mode::Click {
                return Action::Ignore(IgnoredReason::ModeMismatch);
            }
            match event.target {
                HitTarget::Overlay => Action::Ignore(IgnoredReason::InsideOverlay),
                target if is_outside(document, current, target) => Action::Hide,
                _ => Action::Ignore(IgnoredReason::InsideTrigger),
            }
        }
    }
}
