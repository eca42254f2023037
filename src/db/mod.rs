//! Database subsystem (MySQL via sqlx).
//!
//! # Data Flow
//! ```text
//! startup: DatabaseConfig → pool.rs (open, ping, fail fast) → MySqlPool
//! per call: RequestContext + executor + query + [DbValue]
//!     → instrumented.rs (time, forward, race context)
//!     → telemetry sink (exactly one event)
//! ```

pub mod instrumented;
pub mod pool;
pub mod value;

pub use instrumented::{DbError, DeferredRow, InstrumentedDb};
pub use pool::{init_conn_pool, try_init_conn_pool};
pub use value::DbValue;
