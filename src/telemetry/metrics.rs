//! Metrics collection and exposition.
//!
//! # Metrics
//! - `outbound_calls_total` (counter): calls by kind, operation, outcome
//! - `outbound_call_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recorded from the sink path so every emitted event is counted once
//! - Exporter installation is optional; without it the macros are no-ops

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::context::RequestContext;
use crate::telemetry::event::{Severity, TelemetryEvent};
use crate::telemetry::sink::TelemetrySink;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed call.
pub fn record_call(event: &TelemetryEvent) {
    let outcome = match event.severity() {
        Severity::Info => "ok",
        Severity::Error => "error",
    };
    counter!(
        "outbound_calls_total",
        "kind" => event.kind(),
        "operation" => event.operation(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "outbound_call_duration_seconds",
        "kind" => event.kind(),
        "operation" => event.operation()
    )
    .record(event.duration_ms() as f64 / 1000.0);
}

/// Records metrics for each event, then forwards it to `inner`.
#[derive(Debug, Clone, Default)]
pub struct MetricsSink<S> {
    inner: S,
}

impl<S> MetricsSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: TelemetrySink> TelemetrySink for MetricsSink<S> {
    fn info(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        record_call(event);
        self.inner.info(ctx, event);
    }

    fn error(&self, ctx: &RequestContext, event: &TelemetryEvent) {
        record_call(event);
        self.inner.error(ctx, event);
    }
}
