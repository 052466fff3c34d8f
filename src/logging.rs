//! Tracing output for the browser.
//!
//! A `tracing_subscriber::Layer` that formats events on one line and hands
//! them to the browser console, so `warn!` reports from data recovery show up
//! in devtools. Installed once from the module's start function.

use std::fmt::{self, Write as FmtWrite};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Receives one formatted line per event.
pub type ConsoleSink = fn(Level, &str);

// ============================================================================
// Event Visitor
// ============================================================================

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl EventVisitor {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }
}

// ============================================================================
// BrowserConsoleLayer
// ============================================================================

/// Forwards events at or above `max_level` severity to a console sink.
pub struct BrowserConsoleLayer {
    max_level: Level,
    sink: ConsoleSink,
}

impl BrowserConsoleLayer {
    /// Layer writing to the matching `console` method for each level.
    pub fn new(max_level: Level) -> Self {
        Self::with_sink(max_level, browser_console)
    }

    pub fn with_sink(max_level: Level, sink: ConsoleSink) -> Self {
        Self { max_level, sink }
    }

    fn format(event: &Event<'_>) -> String {
        let metadata = event.metadata();
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let mut line = format!("{} {}: ", metadata.level(), metadata.target());
        line.push_str(visitor.message.as_deref().unwrap_or_default());
        for (key, value) in &visitor.fields {
            let _ = write!(line, " {key}={value}");
        }
        line
    }
}

impl<S> Layer<S> for BrowserConsoleLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        // tracing orders levels by verbosity: ERROR < WARN < ... < TRACE
        if level > self.max_level {
            return;
        }
        (self.sink)(level, &Self::format(event));
    }
}

fn browser_console(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        _ => web_sys::console::debug_1(&line),
    }
}

/// Install a registry with a [`BrowserConsoleLayer`] as the global default.
///
/// Returns false when another subscriber was installed first.
pub fn install(max_level: Level) -> bool {
    let subscriber = tracing_subscriber::registry().with(BrowserConsoleLayer::new(max_level));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    thread_local! {
        static LINES: RefCell<Vec<(Level, String)>> = const { RefCell::new(Vec::new()) };
    }

    fn capture(level: Level, line: &str) {
        LINES.with(|lines| lines.borrow_mut().push((level, line.to_string())));
    }

    fn captured() -> Vec<(Level, String)> {
        LINES.with(|lines| lines.borrow_mut().drain(..).collect())
    }

    #[test]
    fn test_filters_below_max_level() {
        let subscriber =
            tracing_subscriber::registry().with(BrowserConsoleLayer::with_sink(Level::WARN, capture));
        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("layout done");
            tracing::info!("refreshed");
            tracing::warn!(id = 7, "duplicate node id");
            tracing::error!("container missing");
        });

        let lines = captured();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].0, Level::WARN);
        assert!(lines[0].1.starts_with("WARN "));
        assert!(lines[0].1.contains(": duplicate node id id=7"));
        assert_eq!(lines[1].0, Level::ERROR);
    }

    #[test]
    fn test_formats_display_fields() {
        let subscriber = tracing_subscriber::registry()
            .with(BrowserConsoleLayer::with_sink(Level::TRACE, capture));
        tracing::subscriber::with_default(subscriber, || {
            let name = "root";
            tracing::debug!(%name, scale = 0.5, collapsed = true, "node");
        });

        let lines = captured();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.ends_with("node name=root scale=0.5 collapsed=true"));
    }

    #[test]
    fn test_reports_recovered_records() {
        use crate::tree::{RecordFields, TreeModel};
        use serde_json::{Map, Value, json};

        let records: Vec<Map<String, Value>> = json!([{"id": 1}, {"name": "no id"}, {"id": 1}])
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect();
        let subscriber =
            tracing_subscriber::registry().with(BrowserConsoleLayer::with_sink(Level::WARN, capture));
        let model = tracing::subscriber::with_default(subscriber, || {
            TreeModel::build(&records, &RecordFields::default()).unwrap()
        });

        assert_eq!(model.len(), 1);
        let lines = captured();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].1.contains("record has no usable id"));
        assert!(lines[1].1.contains("duplicate node id"));
        assert!(lines[1].1.ends_with("id=1"));
    }
}
