//! Tracing layer that feeds the dashboard log panel.
//!
//! Each event becomes one [`LogEntry`]: the message followed by a fixed
//! set of structured fields, e.g.
//! `Tick dropped [event_type=TICK_DROPPED, token_id=tkn-2]`.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use super::app::{AppState, LogEntry};

static SHOW_DEBUG: AtomicBool = AtomicBool::new(false);

/// Entries lost to a busy AppState lock, not yet folded into
/// `AppState.dropped_logs_count`.
static DROPPED_LOGS: AtomicU64 = AtomicU64::new(0);

/// Structured fields worth showing next to the message, in display order.
const SHOWN_FIELDS: [&str; 6] = ["event_type", "token_id", "kind", "version", "session", "error"];

/// Toggle DEBUG entries in the log panel.
pub fn set_show_debug(enabled: bool) {
    SHOW_DEBUG.store(enabled, Ordering::Relaxed);
}

fn panel_accepts(level: &Level) -> bool {
    if *level == Level::TRACE {
        false
    } else if *level == Level::DEBUG {
        SHOW_DEBUG.load(Ordering::Relaxed)
    } else {
        true
    }
}

/// Tracing layer that copies events into the dashboard log panel.
///
/// Never blocks on the AppState mutex: the render loop holds it while
/// drawing and may log from inside. A contended event is counted in
/// `dropped_logs_count` instead.
pub struct TuiLayer {
    app_state: Arc<Mutex<AppState>>,
}

impl TuiLayer {
    pub fn new(app_state: Arc<Mutex<AppState>>) -> Self {
        Self { app_state }
    }
}

impl<S: Subscriber> Layer<S> for TuiLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = event.metadata().level();
        if !panel_accepts(level) {
            return;
        }

        let mut captured = CapturedEvent::default();
        event.record(&mut captured);
        let entry = LogEntry {
            timestamp: chrono::Local::now().format("%H:%M:%S").to_string(),
            level: level.to_string(),
            message: captured.render(),
        };

        let Ok(mut state) = self.app_state.try_lock() else {
            DROPPED_LOGS.fetch_add(1, Ordering::Relaxed);
            return;
        };
        state.dropped_logs_count += DROPPED_LOGS.swap(0, Ordering::Relaxed);
        state.push_log(entry);
    }
}

/// Message text plus the [`SHOWN_FIELDS`] present on one event.
#[derive(Default)]
struct CapturedEvent {
    message: String,
    fields: Vec<(&'static str, String)>,
}

impl CapturedEvent {
    /// `message [k=v, ...]`, with fields in [`SHOWN_FIELDS`] order. An event
    /// with no message shows its `event_type` alone.
    fn render(mut self) -> String {
        self.fields
            .sort_by_key(|(name, _)| SHOWN_FIELDS.iter().position(|shown| shown == name));
        if self.message.is_empty() {
            if let Some(i) = self.fields.iter().position(|(name, _)| *name == "event_type") {
                self.message = self.fields.remove(i).1;
            }
        }
        if self.fields.is_empty() {
            return self.message;
        }
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        format!("{} [{}]", self.message, fields.join(", "))
    }

    fn keep(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = value,
            name if SHOWN_FIELDS.contains(&name) => self.fields.push((field.name(), value)),
            _ => {}
        }
    }
}

impl Visit for CapturedEvent {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.keep(field, format!("{:?}", value).trim_matches('"').to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.keep(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.keep(field, value.to_string());
    }
}
