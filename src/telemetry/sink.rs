//! Telemetry sinks.
//!
//! # Responsibilities
//! - Define the sink capability consumed by the client and DB wrappers
//! - Provide a `tracing`-backed sink for production use
//! - Provide an in-memory sink for tests and embedding

use std::sync::{Arc, Mutex};

use crate::context::RequestContext;
use crate::telemetry::event::{render_headers, Severity, TelemetryEvent};

/// Receives one event per completed call. Implementations must not block.
pub trait TelemetrySink: Send + Sync {
    fn info(&self, ctx: &RequestContext, event: &TelemetryEvent);
    fn error(&self, ctx: &RequestContext, event: &TelemetryEvent);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for Arc<T> {
    fn info(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        (**self).info(ctx, event)
    }

    fn error(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        (**self).error(ctx, event)
    }
}

/// Route an event to `info` or `error` by its severity.
pub fn emit(sink: &dyn TelemetrySink, ctx: &RequestContext, event: &TelemetryEvent) {
    match event.severity() {
        Severity::Info => sink.info(ctx, event),
        Severity::Error => sink.error(ctx, event),
    }
}

/// Writes events as structured `tracing` records under the `outbound` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

macro_rules! trace_event {
    ($level:ident, $ctx:expr, $event:expr) => {{
        let request_id = $ctx.request_id().unwrap_or("-");
        match $event {
            TelemetryEvent::Http(e) => tracing::$level!(
                target: "outbound",
                operation = e.operation,
                request_id = %request_id,
                http_method = %e.method,
                request_url = %e.url,
                request_headers = %render_headers(&e.request_headers),
                request_body = %e.request_body,
                response_status = ?e.response_status,
                response_headers = %render_headers(&e.response_headers),
                response_body = %e.response_body,
                duration_ms = e.duration_ms,
                error = ?e.error,
                "{}", e.operation
            ),
            TelemetryEvent::Db(e) => tracing::$level!(
                target: "outbound",
                operation = e.operation,
                request_id = %request_id,
                query = %e.query,
                args = %e.args,
                duration_ms = e.duration_ms,
                error = ?e.error,
                "{}", e.operation
            ),
        }
    }};
}

impl TelemetrySink for TracingSink {
    fn info(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        trace_event!(info, ctx, event);
    }

    fn error(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        trace_event!(error, ctx, event);
    }
}

/// An event captured by [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    pub severity: Severity,
    pub request_id: Option<String>,
    pub event: TelemetryEvent,
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn record(&self, severity: Severity, ctx: &RequestContext, event: &TelemetryEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(RecordedEvent {
                severity,
                request_id: ctx.request_id().map(str::to_string),
                event: event.clone(),
            });
        }
    }
}

impl TelemetrySink for RecordingSink {
    fn info(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        self.record(Severity::Info, ctx, event);
    }

    fn error(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        self.record(Severity::Error, ctx, event);
    }
}
