#![forbid(unsafe_code)]

//! Layout tracing integration tests.
//!
//! Spans enabled:
//!   cargo test -p siteplan-layout --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test -p siteplan-layout --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use siteplan_core::{Catalog, LayoutConfig, QuantityConfig};
use siteplan_layout::{ItemSequence, LayoutEngine, LayoutMode};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
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
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_spans<F>(f: F) -> Vec<CapturedSpan>
where
    F: FnOnce(),
{
    let spans = Arc::new(Mutex::new(Vec::new()));
    let layer = SpanCapture {
        spans: Arc::clone(&spans),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = spans.lock().unwrap().clone();
    captured
}

fn run_both_modes() {
    let catalog = Catalog::standard();
    let quantities =
        QuantityConfig::from_pairs(&catalog, [("megapack-xl", 4), ("powerpack", 6)]).unwrap();
    let sequence = ItemSequence::expand(&catalog, &quantities);
    let engine = LayoutEngine::new(&catalog, &LayoutConfig::default());
    let _ = engine.compute(sequence.items(), LayoutMode::Auto);
    let _ = engine.compute(sequence.items(), LayoutMode::Manual);
}

// ============================================================================
// Tests
// ============================================================================

#[test]
#[cfg(feature = "tracing")]
fn compute_layout_span_records_mode_and_items() {
    let spans = with_captured_spans(run_both_modes);
    let layout_spans: Vec<_> = spans
        .iter()
        .filter(|s| s.name == "compute_layout")
        .collect();
    assert_eq!(layout_spans.len(), 2, "one span per layout pass");

    let modes: Vec<_> = layout_spans
        .iter()
        .filter_map(|s| s.fields.get("mode").cloned())
        .collect();
    assert_eq!(modes, ["auto", "manual"]);

    for span in layout_spans {
        // 10 batteries + 5 derived transformers
        assert_eq!(span.fields.get("items").map(String::as_str), Some("15"));
    }
}

#[test]
#[cfg(not(feature = "tracing"))]
fn zero_overhead_without_feature() {
    let spans = with_captured_spans(run_both_modes);
    assert!(
        spans.iter().all(|s| s.name != "compute_layout"),
        "no layout spans expected without the tracing feature"
    );
}
