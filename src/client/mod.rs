//! Instrumented outbound HTTP client.
//!
//! # Data Flow
//! ```text
//! caller (RequestContext + Request<Body>)
//!     → body.rs (capture request body, replay fresh stream)
//!     → transport.rs (Transport::send, reqwest by default)
//!     → body.rs (buffer response, gunzip when Content-Encoding says so)
//!     → telemetry sink (exactly one event)
//!     → CallResponse { status, headers, decoded body }
//! ```

pub mod body;
pub mod error;
pub mod instrumented;
pub mod tls;
pub mod transport;

pub use error::{ClientError, ClientResult, TransportError};
pub use instrumented::{
    CallResponse, Decompression, EventCompat, InstrumentedClient, HTTP_CALL_OPERATION,
};
pub use tls::{TlsPolicy, TlsVersion};
pub use transport::{ReqwestTransport, Transport};
