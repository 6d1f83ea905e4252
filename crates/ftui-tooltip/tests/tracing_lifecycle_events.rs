#![forbid(unsafe_code)]

//! Tracing output of the tooltip lifecycle.
//!
//! Verifies the `tooltip.show` span, that lifecycle events land on the
//! `ftui.tooltip` target at the expected levels, and that events emitted
//! while showing are parented to the span.
//!
//! Run:
//!   cargo test -p ftui-tooltip --test tracing_lifecycle_events

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ftui_tooltip::{
    Document, Effect, FetchError, MemoryDocument, Rect, Tooltip, TooltipOptions,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct CapturedSpan {
    name: String,
    target: String,
    level: tracing::Level,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

struct Capture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn event(&self, message: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.message == message)
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for Capture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            target: attrs.metadata().target().to_string(),
            level: *attrs.metadata().level(),
            fields: visitor.0.into_iter().collect(),
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .current_span()
            .id()
            .and_then(|id| ctx.span(id))
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured<F: FnOnce()>(f: F) -> CaptureHandle {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = Capture {
        spans: spans.clone(),
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { spans, events }
}

fn setup(options: TooltipOptions, content: &str) -> (MemoryDocument, Tooltip) {
    let mut doc = MemoryDocument::new();
    let node = doc.create("a", None);
    doc.set_attribute(node, "class", "tip");
    doc.set_attribute(node, "data-tooltip", content);
    doc.set_rect(node, Rect::new(10, 40, 30, 10));
    let tooltip = Tooltip::attach(options, &mut doc, ".tip").unwrap();
    (doc, tooltip)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn show_opens_span_with_node_and_generation() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default(), "Hello");
    let node = tooltip.triggers()[0];

    let handle = with_captured(|| tooltip.show(&mut doc, node, None, None));

    let spans = handle.spans();
    let span = spans
        .iter()
        .find(|s| s.name == "tooltip.show")
        .expect("tooltip.show span");
    assert_eq!(span.target, "ftui.tooltip");
    assert_eq!(span.level, tracing::Level::DEBUG);
    assert_eq!(span.fields.get("node").map(String::as_str), Some("node:0"));
    assert_eq!(span.fields.get("generation").map(String::as_str), Some("1"));
}

#[test]
fn shown_event_is_parented_to_show_span() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default(), "Hello");
    let node = tooltip.triggers()[0];

    let handle = with_captured(|| tooltip.show(&mut doc, node, None, None));

    let shown = handle.event("tooltip shown").expect("shown event");
    assert_eq!(shown.level, tracing::Level::DEBUG);
    assert_eq!(shown.target, "ftui.tooltip");
    assert_eq!(shown.parent_span_name.as_deref(), Some("tooltip.show"));
}

#[test]
fn every_lifecycle_event_uses_tooltip_target() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default().ajax(true), "/tips/a");
    let node = tooltip.triggers()[0];

    let handle = with_captured(|| {
        tooltip.show(&mut doc, node, None, None);
        let effects = tooltip.drain_effects();
        for effect in effects {
            if let Effect::Fetch(request) = effect {
                tooltip
                    .complete_fetch(&mut doc, request.id, Ok("A".into()))
                    .unwrap();
            }
        }
        tooltip.hide(&mut doc);
    });

    let events = handle.events();
    assert!(!events.is_empty());
    assert!(events.iter().all(|e| e.target == "ftui.tooltip"));
    assert!(handle.event("content cache miss; fetching").is_some());
    assert!(handle.event("fetch completed; presenting").is_some());
    assert!(handle.event("tooltip hidden").is_some());
}

#[test]
fn fetch_failure_logs_warning_with_url() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default().ajax(true), "/tips/broken");
    let node = tooltip.triggers()[0];
    tooltip.show(&mut doc, node, None, None);
    let id = tooltip
        .drain_effects()
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Fetch(request) => Some(request.id),
            _ => None,
        })
        .unwrap();

    let handle = with_captured(|| {
        tooltip
            .complete_fetch(&mut doc, id, Err(FetchError::Status(503)))
            .unwrap();
    });

    let failed = handle
        .event("tooltip content fetch failed")
        .expect("warning event");
    assert_eq!(failed.level, tracing::Level::WARN);
    assert_eq!(failed.fields.get("url").map(String::as_str), Some("/tips/broken"));
    assert_eq!(
        failed.fields.get("error").map(String::as_str),
        Some("HTTP status 503")
    );
}

#[test]
fn unparsable_override_is_logged_and_ignored() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default(), "Hello");
    let node = tooltip.triggers()[0];
    doc.set_attribute(node, "data-tooltip-x-offset", "wide");

    let handle = with_captured(|| tooltip.show(&mut doc, node, None, None));

    let ignored = handle
        .event("ignoring unparsable option override")
        .expect("override event");
    assert_eq!(ignored.level, tracing::Level::DEBUG);
    assert_eq!(
        ignored.fields.get("attribute").map(String::as_str),
        Some("data-tooltip-x-offset")
    );
    assert_eq!(tooltip.runtime_options().map(|o| o.x_offset), Some(0));
}

#[test]
fn stale_reveal_is_logged() {
    let (mut doc, mut tooltip) = setup(TooltipOptions::default().delay_ms(10), "Hello");
    let node = tooltip.triggers()[0];
    tooltip.show(&mut doc, node, None, None);
    tooltip.hide(&mut doc);

    let handle = with_captured(|| {
        assert!(!tooltip.reveal_elapsed(ftui_tooltip::RevealTicket(1)));
    });

    assert!(handle.event("stale reveal ignored").is_some());
}
