#![forbid(unsafe_code)]

//! The tooltip instance and its lifecycle.
//!
//! One [`Tooltip`] owns one [`Overlay`] and any number of trigger nodes. At
//! most one trigger is current at a time.
//!
//! # Phases
//!
//! ```text
//! Hidden ──show──▶ Pending ──fetch──▶ Positioning ──delay──▶ Shown
//!    ▲               │ (cache hit / literal / fragment) ──────▶ Shown | Following
//!    └────hide───────┴──────────────────────────────────────────┘
//! ```
//!
//! # Invariants
//!
//! 1. Runtime options are set only at the start of [`show`](Tooltip::show)
//!    and cleared only by [`reset`](Tooltip::reset); they are `None` whenever
//!    no trigger is current.
//! 2. A fetch completion or reveal timer only touches the overlay if the
//!    trigger that caused it is still current and still waiting for it.
//! 3. Each content key is fetched at most once per instance: completed keys
//!    are served from the cache, in-flight keys are awaited, not refetched.
//! 4. Every `Shown` is eventually followed by exactly one `Hiding`/`Hidden`
//!    pair; [`hide`](Tooltip::hide) with nothing shown emits nothing.
//!
//! # Example
//!
//! ```
//! use ftui_tooltip::{Document, Effect, MemoryDocument, Tooltip, TooltipEvent, TooltipOptions};
//!
//! let mut doc = MemoryDocument::new();
//! let link = doc.create("a", None);
//! doc.set_attribute(link, "class", "tip");
//! doc.set_attribute(link, "data-tooltip", "Hello");
//!
//! let mut tooltip = Tooltip::attach(TooltipOptions::default(), &mut doc, ".tip").unwrap();
//! tooltip.show(&mut doc, link, None, None);
//!
//! assert_eq!(tooltip.overlay().body().markup(), "Hello");
//! assert!(tooltip
//!     .drain_effects()
//!     .iter()
//!     .any(|e| matches!(e, Effect::Notify(TooltipEvent::Shown { .. }))));
//! ```

use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::{AHashMap, AHashSet};
use web_time::Duration;

use crate::content::{ContentCache, ContentSource, Payload};
use crate::document::{Document, NodeId};
use crate::error::TooltipError;
use crate::event::{
    Effect, FetchError, FetchRequest, PointerEvent, RequestId, RevealTicket, TooltipEvent,
};
use crate::geometry::{Point, Size};
use crate::interaction::{self, Action, IgnoredReason, InteractionState};
use crate::options::{self, AttributeNames, OptionsError, TooltipOptions};
use crate::overlay::Overlay;
use crate::placement::{Anchor, AnchoredPositioner, Placement, PlacementRequest, Positioner};

/// Attribute linking a trigger to the overlay while shown.
pub const ARIA_DESCRIBEDBY: &str = "aria-describedby";

/// Native title attribute migrated away on registration.
pub const NATIVE_TITLE: &str = "title";

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Lifecycle phase of a tooltip instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing shown.
    Hidden,
    /// Waiting for a fetch with nothing rendered.
    Pending,
    /// Rendered and placed; reveal delay running.
    Positioning,
    /// Visible at a fixed placement.
    Shown,
    /// Visible and tracking the pointer.
    Following,
}

#[derive(Debug, Clone)]
struct Current {
    node: NodeId,
    generation: u64,
    title: Option<String>,
    /// Content key of the fetch this show waits for.
    awaiting: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AppliedClasses {
    placement: Placement,
    /// `animation` then `class_name`, blanks skipped.
    appearance: Vec<String>,
}

impl AppliedClasses {
    fn for_options(placement: Placement, runtime: &TooltipOptions) -> Self {
        let appearance = [&runtime.animation, &runtime.class_name]
            .into_iter()
            .filter(|class| !class.trim().is_empty())
            .cloned()
            .collect();
        Self {
            placement,
            appearance,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presentation {
    Content,
    Placeholder,
}

/// A tooltip overlay bound to a set of trigger nodes.
pub struct Tooltip {
    defaults: TooltipOptions,
    names: AttributeNames,
    selector: Option<String>,
    triggers: AHashSet<NodeId>,
    cache: ContentCache,
    overlay: Overlay,
    positioner: Box<dyn Positioner>,
    current: Option<Current>,
    runtime: Option<TooltipOptions>,
    applied: Option<AppliedClasses>,
    phase: Phase,
    generation: u64,
    shown_generation: Option<u64>,
    next_request: u64,
    in_flight: AHashMap<RequestId, String>,
    reveal_ticket: Option<RevealTicket>,
    follow: Option<NodeId>,
    pointer: Option<Point>,
    pointer_at: Option<Duration>,
    last_follow: Option<Duration>,
    effects: Vec<Effect>,
}

impl fmt::Debug for Tooltip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tooltip")
            .field("overlay", &self.overlay.id())
            .field("phase", &self.phase)
            .field("current", &self.current_node())
            .field("triggers", &self.triggers.len())
            .field("cached", &self.cache.len())
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl Tooltip {
    /// Create an instance with no triggers.
    pub fn new(options: TooltipOptions) -> Result<Self, TooltipError> {
        let errors = options.validate();
        if !errors.is_empty() {
            return Err(OptionsError::Validation(errors).into());
        }
        let instance = NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed);
        let overlay = Overlay::new(format!("tooltip-{instance}"), options.template.clone());
        let names = AttributeNames::new(&options.attribute_prefix);
        Ok(Self {
            defaults: options,
            names,
            selector: None,
            triggers: AHashSet::new(),
            cache: ContentCache::new(),
            overlay,
            positioner: Box::new(AnchoredPositioner),
            current: None,
            runtime: None,
            applied: None,
            phase: Phase::Hidden,
            generation: 0,
            shown_generation: None,
            next_request: 0,
            in_flight: AHashMap::new(),
            reveal_ticket: None,
            follow: None,
            pointer: None,
            pointer_at: None,
            last_follow: None,
            effects: Vec::new(),
        })
    }

    /// Create an instance managing every element matching `selector`.
    pub fn attach<D: Document + ?Sized>(
        options: TooltipOptions,
        document: &mut D,
        selector: &str,
    ) -> Result<Self, TooltipError> {
        let mut tooltip = Self::new(options)?;
        tooltip.selector = Some(selector.to_string());
        let registered = tooltip.register_matching(document);
        tracing::debug!(
            target: "ftui.tooltip",
            overlay = tooltip.overlay.id(),
            selector,
            registered,
            "tooltip attached"
        );
        Ok(tooltip)
    }

    /// Replace the placement strategy.
    #[must_use]
    pub fn with_positioner(mut self, positioner: impl Positioner + 'static) -> Self {
        self.positioner = Box::new(positioner);
        self
    }

    /// Register elements added to the document since [`attach`](Self::attach).
    ///
    /// Returns the number of newly registered triggers.
    pub fn register_matching<D: Document + ?Sized>(&mut self, document: &mut D) -> usize {
        let Some(selector) = self.selector.clone() else {
            return 0;
        };
        document
            .query_all(&selector)
            .into_iter()
            .filter(|&node| self.register(document, node))
            .count()
    }

    /// Manage `node` as a trigger.
    ///
    /// A native `title` attribute moves to the private native-title
    /// attribute so the browser's own tooltip doesn't compete. Returns
    /// `false` if the node was already registered.
    pub fn register<D: Document + ?Sized>(&mut self, document: &mut D, node: NodeId) -> bool {
        if !self.triggers.insert(node) {
            return false;
        }
        if let Some(title) = document.remove_attribute(node, NATIVE_TITLE) {
            document.set_attribute(node, &self.names.native_title, &title);
        }
        true
    }

    /// Stop managing `node`, hiding it if current and restoring its title.
    pub fn detach<D: Document + ?Sized>(&mut self, document: &mut D, node: NodeId) -> bool {
        if !self.triggers.remove(&node) {
            return false;
        }
        if self.current_node() == Some(node) {
            self.hide(document);
        }
        if let Some(title) = document.remove_attribute(node, &self.names.native_title) {
            document.set_attribute(node, NATIVE_TITLE, &title);
        }
        true
    }

    /// Hide and detach every trigger.
    pub fn destroy<D: Document + ?Sized>(&mut self, document: &mut D) {
        self.hide(document);
        for node in self.triggers() {
            self.detach(document, node);
        }
    }

    /// Instance defaults.
    #[must_use]
    pub fn options(&self) -> &TooltipOptions {
        &self.defaults
    }

    /// Options in effect for the current trigger.
    #[must_use]
    pub fn runtime_options(&self) -> Option<&TooltipOptions> {
        self.runtime.as_ref()
    }

    #[must_use]
    pub fn attribute_names(&self) -> &AttributeNames {
        &self.names
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The current trigger, shown or still loading.
    #[must_use]
    pub fn current(&self) -> Option<NodeId> {
        self.current_node()
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    #[must_use]
    pub fn is_registered(&self, node: NodeId) -> bool {
        self.triggers.contains(&node)
    }

    /// Registered triggers in node order.
    #[must_use]
    pub fn triggers(&self) -> Vec<NodeId> {
        let mut nodes: Vec<_> = self.triggers.iter().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// Number of fetches issued and not yet completed.
    #[must_use]
    pub fn pending_fetches(&self) -> usize {
        self.in_flight.len()
    }

    /// Take every queued effect, oldest first.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Show the tooltip for `node`.
    ///
    /// `content` and `title` override what the node's attributes say. Empty
    /// content shows nothing; if another trigger was shown it is hidden, so
    /// observers still get its `Hiding`/`Hidden` pair.
    pub fn show<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        node: NodeId,
        content: Option<&str>,
        title: Option<&str>,
    ) {
        let generation = self.generation + 1;
        let _span =
            tracing::debug_span!(target: "ftui.tooltip", "tooltip.show", node = %node, generation)
                .entered();

        self.reset();

        let runtime = options::resolve(&self.defaults, &self.names, document, node);
        let content = match content {
            Some(content) => Some(content.to_string()),
            None => document.attribute(node, &runtime.get_content),
        };
        let Some(content) = content.filter(|c| !c.trim().is_empty()) else {
            tracing::debug!(target: "ftui.tooltip", %node, "show skipped: no content");
            self.hide(document);
            return;
        };
        let title = match title {
            Some(title) => Some(title.to_string()),
            None => self.read_title(document, node, &runtime),
        };

        if let Some(previous) = self.current_node()
            && previous != node
        {
            self.hide(document);
        }

        self.generation = generation;
        let source = ContentSource::classify(document, &content, runtime.ajax);
        self.current = Some(Current {
            node,
            generation,
            title: title.clone(),
            awaiting: None,
        });
        self.runtime = Some(runtime);
        self.emit(TooltipEvent::Showing { node });

        match source {
            ContentSource::Fragment { markup, .. } | ContentSource::Literal(markup) => {
                self.position(document, Payload::Markup(markup), title.as_deref());
            }
            ContentSource::Remote(url) => self.show_remote(document, node, url, title.as_deref()),
        }
    }

    fn show_remote<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        node: NodeId,
        url: String,
        title: Option<&str>,
    ) {
        if let Some(markup) = self.cache.get(&url).map(str::to_string) {
            tracing::debug!(target: "ftui.tooltip", url = %url, "content cache hit");
            self.position(document, Payload::Markup(markup), title);
            return;
        }

        if let Some(current) = self.current.as_mut() {
            current.awaiting = Some(url.clone());
        }
        self.phase = Phase::Pending;

        if self.in_flight.values().any(|key| *key == url) {
            tracing::debug!(target: "ftui.tooltip", url = %url, "awaiting in-flight fetch");
        } else {
            self.next_request += 1;
            let id = RequestId(self.next_request);
            self.in_flight.insert(id, url.clone());
            tracing::debug!(target: "ftui.tooltip", %id, url = %url, "content cache miss; fetching");
            self.effects.push(Effect::Fetch(FetchRequest {
                id,
                url,
                node,
            }));
        }

        let placeholder = self
            .runtime
            .as_ref()
            .filter(|runtime| runtime.show_loading)
            .map(|runtime| runtime.loading.clone());
        match placeholder {
            Some(loading) => self.present(document, &loading, title, Presentation::Placeholder),
            None => self.position(document, Payload::Pending, title),
        }
    }

    /// Render `payload` into the overlay for the current trigger, place it
    /// and reveal it (now, or after the configured delay).
    ///
    /// [`Payload::Pending`] is a no-op. Without a current trigger nothing
    /// happens.
    pub fn position<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        payload: Payload,
        title: Option<&str>,
    ) {
        match payload {
            Payload::Pending => {
                tracing::trace!(target: "ftui.tooltip", "position skipped: content still loading");
            }
            Payload::Markup(markup) => {
                self.present(document, &markup, title, Presentation::Content);
            }
        }
    }

    fn present<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        markup: &str,
        title: Option<&str>,
        presentation: Presentation,
    ) {
        let (Some(node), Some(runtime)) = (self.current_node(), self.runtime.clone()) else {
            return;
        };

        let head = title.filter(|_| runtime.show_title);
        self.overlay.set_head(head);
        self.overlay.set_body(markup);
        document.set_attribute(node, ARIA_DESCRIBEDBY, self.overlay.id());
        if presentation == Presentation::Content {
            self.emit(TooltipEvent::Load {
                node,
                content: markup.to_string(),
            });
        }

        let size = document.measure(&self.overlay);
        if runtime.follow {
            self.follow = Some(node);
            let point = self
                .pointer
                .or_else(|| document.bounding_rect(node).map(|rect| rect.origin()))
                .unwrap_or_default();
            self.place_at(document, Anchor::Pointer(point), &runtime, size);
            self.last_follow = self.pointer_at;
            self.reveal(node, Phase::Following);
            return;
        }

        let anchor = document.bounding_rect(node).unwrap_or_default();
        self.place_at(document, Anchor::Element(anchor), &runtime, size);

        let delay = runtime.delay();
        if delay.is_zero() || self.overlay.is_visible() {
            self.reveal(node, Phase::Shown);
        } else if self.reveal_ticket.is_none() {
            let ticket = RevealTicket(self.generation);
            self.reveal_ticket = Some(ticket);
            self.phase = Phase::Positioning;
            tracing::debug!(
                target: "ftui.tooltip",
                %node,
                delay_ms = runtime.delay_ms,
                "reveal scheduled"
            );
            self.effects.push(Effect::ScheduleReveal { ticket, delay });
        }
    }

    fn place_at<D: Document + ?Sized>(
        &mut self,
        document: &D,
        anchor: Anchor,
        runtime: &TooltipOptions,
        size: Size,
    ) {
        let mut request = PlacementRequest::new(anchor, runtime.position, size)
            .offset(runtime.x_offset, runtime.y_offset)
            .auto_flip(runtime.flip);
        if let Some(viewport) = document.viewport() {
            request = request.viewport(viewport);
        }
        let placed = self.positioner.place(&request);
        self.apply_classes(AppliedClasses::for_options(placed.placement, runtime));
        self.overlay.move_to(placed.origin);
    }

    fn apply_classes(&mut self, classes: AppliedClasses) {
        if self.applied.as_ref() == Some(&classes) {
            return;
        }
        self.clear_applied_classes();
        self.overlay.add_class(&classes.placement.class_name());
        for class in &classes.appearance {
            self.overlay.add_class(class);
        }
        self.applied = Some(classes);
    }

    fn clear_applied_classes(&mut self) {
        if let Some(applied) = self.applied.take() {
            self.overlay.remove_class(&applied.placement.class_name());
            for class in &applied.appearance {
                self.overlay.remove_class(class);
            }
        }
    }

    fn reveal(&mut self, node: NodeId, phase: Phase) {
        self.overlay.reveal();
        self.phase = phase;
        self.reveal_ticket = None;
        if self.shown_generation != Some(self.generation) {
            self.shown_generation = Some(self.generation);
            tracing::debug!(target: "ftui.tooltip", %node, ?phase, "tooltip shown");
            self.emit(TooltipEvent::Shown { node });
        }
    }

    /// Host callback: the delay from [`Effect::ScheduleReveal`] elapsed.
    ///
    /// Returns `true` if the overlay was revealed; stale tickets (the
    /// tooltip moved on or was hidden) return `false`.
    pub fn reveal_elapsed(&mut self, ticket: RevealTicket) -> bool {
        let live = self.reveal_ticket == Some(ticket)
            && self
                .current
                .as_ref()
                .is_some_and(|current| current.generation == ticket.0);
        let Some(node) = self.current_node().filter(|_| live) else {
            tracing::debug!(target: "ftui.tooltip", ticket = ticket.0, "stale reveal ignored");
            return false;
        };
        self.reveal(node, Phase::Shown);
        true
    }

    /// Host callback: a fetch from [`Effect::Fetch`] finished.
    ///
    /// Successful content is always cached. It is presented only if the
    /// current trigger is still waiting for that key. Failures are reported
    /// as [`TooltipEvent::FetchFailed`] and hide a tooltip that was waiting.
    pub fn complete_fetch<D: Document + ?Sized>(
        &mut self,
        document: &mut D,
        id: RequestId,
        result: Result<String, FetchError>,
    ) -> Result<(), TooltipError> {
        let Some(key) = self.in_flight.remove(&id) else {
            tracing::warn!(target: "ftui.tooltip", %id, "completion for unknown fetch");
            return Err(TooltipError::UnknownRequest(id));
        };
        let waiting = self
            .current
            .as_ref()
            .filter(|current| current.awaiting.as_deref() == Some(key.as_str()))
            .map(|current| (current.node, current.title.clone()));

        match result {
            Ok(markup) => {
                self.cache.insert(&key, markup);
                let Some((node, title)) = waiting else {
                    tracing::debug!(
                        target: "ftui.tooltip",
                        %id,
                        url = %key,
                        "fetch completed for abandoned trigger; cached only"
                    );
                    return Ok(());
                };
                if let Some(current) = self.current.as_mut() {
                    current.awaiting = None;
                }
                let markup = self.cache.get(&key).unwrap_or_default().to_string();
                tracing::debug!(target: "ftui.tooltip", %id, %node, "fetch completed; presenting");
                self.position(document, Payload::Markup(markup), title.as_deref());
            }
            Err(error) => {
                tracing::warn!(
                    target: "ftui.tooltip",
                    %id,
                    url = %key,
                    %error,
                    "tooltip content fetch failed"
                );
                self.emit(TooltipEvent::FetchFailed { url: key, error });
                if waiting.is_some() {
                    self.hide(document);
                }
            }
        }
        Ok(())
    }

    /// Undo the current presentation's classes and forget its runtime
    /// options, follow binding and pending reveal.
    ///
    /// Idempotent; with nothing active it changes nothing.
    pub fn reset(&mut self) {
        let runtime = self.runtime.take();
        if self.applied.is_none()
            && let Some(runtime) = &runtime
        {
            self.applied = Some(AppliedClasses::for_options(runtime.position, runtime));
        }
        self.clear_applied_classes();
        self.follow = None;
        self.last_follow = None;
        self.reveal_ticket = None;
        if let Some(current) = self.current.as_mut() {
            current.awaiting = None;
        }
        self.phase = if self.overlay.is_visible() {
            Phase::Shown
        } else {
            Phase::Hidden
        };
    }

    /// Conceal the overlay and release the current trigger.
    ///
    /// Emits `Hiding`/`Hidden` around the work. Does nothing if no trigger
    /// is current and the overlay is already concealed.
    pub fn hide<D: Document + ?Sized>(&mut self, document: &mut D) {
        if self.current.is_none() && !self.overlay.is_visible() {
            return;
        }
        let node = self.current_node();
        self.emit(TooltipEvent::Hiding { node });

        self.reset();
        self.overlay.conceal();
        if let Some(node) = node
            && document.attribute(node, ARIA_DESCRIBEDBY).as_deref() == Some(self.overlay.id())
        {
            document.remove_attribute(node, ARIA_DESCRIBEDBY);
        }
        self.current = None;
        self.shown_generation = None;
        self.phase = Phase::Hidden;

        tracing::debug!(target: "ftui.tooltip", node = ?node, "tooltip hidden");
        self.emit(TooltipEvent::Hidden { node });
    }

    /// Route a pointer event through the interaction controller and apply
    /// the resulting action.
    ///
    /// Follow moves stamped less than `mouse_throttle_ms` after the last
    /// reposition come back as [`IgnoredReason::Throttled`].
    pub fn handle<D: Document + ?Sized>(&mut self, document: &mut D, event: &PointerEvent) -> Action {
        self.pointer = Some(event.position);
        self.pointer_at = event.timestamp;
        let state = InteractionState {
            current: self.current_node(),
            current_mode: self
                .runtime
                .as_ref()
                .map_or(self.defaults.mode, |runtime| runtime.mode),
            following: self.follow,
        };
        let (defaults, names) = (&self.defaults, &self.names);
        let action = interaction::decide(
            &*document,
            &self.triggers,
            &state,
            |node| options::resolve_mode(defaults, names, &*document, node),
            event,
        );
        let action = match action {
            Action::Follow(point) if self.follow_throttled() => {
                tracing::trace!(target: "ftui.tooltip", x = point.x, y = point.y, "follow move throttled");
                Action::Ignore(IgnoredReason::Throttled)
            }
            other => other,
        };
        tracing::trace!(target: "ftui.tooltip", ?event, ?action, "pointer dispatch");

        match action {
            Action::Show(node) => self.show(document, node, None, None),
            Action::Hide => self.hide(document),
            Action::Follow(point) => self.follow_to(&*document, point),
            Action::Ignore(_) => {}
        }
        action
    }

    fn follow_to<D: Document + ?Sized>(&mut self, document: &D, point: Point) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };
        let size = document.measure(&self.overlay);
        self.place_at(document, Anchor::Pointer(point), &runtime, size);
        self.runtime = Some(runtime);
        self.last_follow = self.pointer_at;
        tracing::trace!(target: "ftui.tooltip", x = point.x, y = point.y, "follow reposition");
    }

    fn follow_throttled(&self) -> bool {
        let Some(runtime) = &self.runtime else {
            return false;
        };
        match (self.pointer_at, self.last_follow) {
            (Some(now), Some(last)) => now.saturating_sub(last) < runtime.mouse_throttle(),
            _ => false,
        }
    }

    fn read_title<D: Document + ?Sized>(
        &self,
        document: &D,
        node: NodeId,
        runtime: &TooltipOptions,
    ) -> Option<String> {
        document
            .attribute(node, &runtime.get_title)
            .filter(|title| !title.is_empty())
            .or_else(|| {
                document
                    .attribute(node, &self.names.native_title)
                    .filter(|title| !title.is_empty())
            })
    }

    fn current_node(&self) -> Option<NodeId> {
        self.current.as_ref().map(|current| current.node)
    }

    fn emit(&mut self, event: TooltipEvent) {
        self.effects.push(Effect::Notify(event));
    }
}
