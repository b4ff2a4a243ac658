//! Log capture for asserting on engine warnings.

use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Remaining fields, rendered with `Debug`.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields
                .push((field.name().to_string(), format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }
}

/// A tracing layer that records every event.
pub struct EventCaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl<S: Subscriber> Layer<S> for EventCaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);
        let captured = CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(captured);
        }
    }
}

/// Handle to the events captured since [`capture`] was called.
#[derive(Clone)]
pub struct CapturedEvents {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CapturedEvents {
    pub fn all(&self) -> Vec<CapturedEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Events at `level` whose message contains `needle`.
    pub fn matching(&self, level: Level, needle: &str) -> Vec<CapturedEvent> {
        self.all()
            .into_iter()
            .filter(|event| event.level == level && event.message.contains(needle))
            .collect()
    }
}

/// Installs a capturing subscriber for the current thread.
///
/// Events are recorded until the returned guard is dropped. Use with a
/// current-thread runtime so spawned tasks are captured too.
pub fn capture() -> (CapturedEvents, DefaultGuard) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCaptureLayer {
        events: Arc::clone(&events),
    };
    let subscriber = Registry::default().with(layer);
    let guard = tracing::subscriber::set_default(subscriber);
    (CapturedEvents { events }, guard)
}
