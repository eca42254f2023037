//! Telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! InstrumentedClient / InstrumentedDb
//!     → event.rs (one TelemetryEvent per call)
//!     → sink.rs (TelemetrySink: tracing, in-memory, ...)
//!     → metrics.rs (optional MetricsSink wrapper, Prometheus exporter)
//!     → logging.rs (subscriber setup for the tracing sink)
//! ```

pub mod event;
pub mod logging;
pub mod metrics;
pub mod sink;

pub use event::{DbCallEvent, HeaderPairs, HttpCallEvent, Severity, TelemetryEvent};
pub use metrics::MetricsSink;
pub use sink::{emit, RecordedEvent, RecordingSink, TelemetrySink, TracingSink};
