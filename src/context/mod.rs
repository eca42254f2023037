//! Request-scoped context and its implicit propagation.
//!
//! # Data Flow
//! ```text
//! caller builds RequestContext (id, deadline, cancellation, values)
//!     → passed explicitly to InstrumentedClient / InstrumentedDb
//!     → or installed via store::scope / store::sync_scope
//!         → store::current() inside the scope returns it
//!         → outside any scope, current() returns background()
//! ```
//!
//! # Design Decisions
//! - Explicit context parameters are the primary API
//! - The task-local store is a boundary adapter for call surfaces that
//!   cannot take a context argument
//! - Scopes are per task: spawned tasks start empty unless `propagate` is used

pub mod request_context;
pub mod store;

pub use request_context::{Done, RequestContext};
pub use store::{current, is_installed, propagate, scope, sync_scope};
