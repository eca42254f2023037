//! Request-scoped telemetry for outbound calls.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller ──┬── RequestContext (explicit)      ┌──────────────────────┐
//!            └── context::scope / current() ───▶│  InstrumentedClient  │──▶ Transport (reqwest)
//!                                               │  capture / replay    │
//!                                               │  time / gunzip       │
//!                                               └──────────┬───────────┘
//!                                                          │ one event per call
//!   InstrumentedDb (sqlx MySQL) ───────────────────────────┤
//!                                                          ▼
//!                                               TelemetrySink (tracing, metrics, memory)
//! ```

// Core
pub mod client;
pub mod context;
pub mod db;

// Cross-cutting concerns
pub mod config;
pub mod telemetry;

pub use client::{CallResponse, ClientError, InstrumentedClient};
pub use config::AppConfig;
pub use context::RequestContext;
pub use db::InstrumentedDb;
pub use telemetry::{TelemetryEvent, TelemetrySink};
