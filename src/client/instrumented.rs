//! Instrumented HTTP client.
//!
//! # Responsibilities
//! - Capture the request body once and replay it to the transport
//! - Time the transport call
//! - Buffer and (optionally) gunzip the response body
//! - Emit exactly one telemetry event per call, on every path
//!
//! # Design Decisions
//! - Bodies are fully materialized; there is no streaming pass-through
//! - Original request and response streams are owned by this call and
//!   dropped exactly once, whichever path returns
//! - The context's cancellation and deadline race the transport call

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Request, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::client::body::{body_text, capture, gunzip, is_gzip, replay};
use crate::client::error::{ClientError, ClientResult, TransportError};
use crate::client::tls::TlsPolicy;
use crate::client::transport::{ReqwestTransport, Transport};
use crate::config::ClientConfig;
use crate::context::{self, RequestContext};
use crate::telemetry::event::{header_pairs, HeaderPairs, HttpCallEvent};
use crate::telemetry::sink::{emit, TelemetrySink, TracingSink};

/// Operation tag carried by every HTTP event.
pub const HTTP_CALL_OPERATION: &str = "http_client.call";

/// Whether gzip-encoded responses are decoded before being returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decompression {
    #[default]
    Auto,
    Disabled,
}

/// Field layout of emitted events.
///
/// `Legacy` reproduces the historical event shape byte for byte: the URL is
/// `scheme + "//" + host + path + raw_query` with no `?`, and a call with no
/// response echoes the request body into `response_body`. `Standard` emits a
/// well-formed URL and leaves `response_body` empty in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCompat {
    #[default]
    Standard,
    Legacy,
}

/// A completed call: response head and decoded body.
#[derive(Debug, Clone)]
pub struct CallResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CallResponse {
    pub fn text(&self) -> String {
        body_text(&self.body)
    }
}

/// HTTP client wrapper that records every call as a telemetry event.
#[derive(Clone)]
pub struct InstrumentedClient<T = ReqwestTransport> {
    transport: T,
    sink: Arc<dyn TelemetrySink>,
    decompression: Decompression,
    compat: EventCompat,
}

impl InstrumentedClient<ReqwestTransport> {
    /// Client over reqwest. A zero `timeout` selects the 5 second default;
    /// `tls` overrides platform TLS defaults when present.
    pub fn new(timeout: Duration, tls: Option<TlsPolicy>) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(timeout, tls.as_ref())?;
        Ok(Self::with_transport(transport))
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let transport = ReqwestTransport::new(config.timeout(), config.tls.as_ref())?;
        Ok(Self::with_transport(transport)
            .with_decompression(config.decompression)
            .with_event_compat(config.event_compat))
    }
}

impl<T: Transport> InstrumentedClient<T> {
    /// Client over an arbitrary transport, logging through `tracing`.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            sink: Arc::new(TracingSink),
            decompression: Decompression::Auto,
            compat: EventCompat::Standard,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_decompression(mut self, decompression: Decompression) -> Self {
        self.decompression = decompression;
        self
    }

    pub fn with_event_compat(mut self, compat: EventCompat) -> Self {
        self.compat = compat;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Entry point for callers that may not have a context or request.
    ///
    /// Missing inputs fail with [`ClientError::Precondition`] before anything
    /// is sent; one error event is still emitted.
    pub async fn try_call(
        &self,
        ctx: Option<&RequestContext>,
        request: Option<Request<Body>>,
    ) -> ClientResult<CallResponse> {
        let Some(ctx) = ctx else {
            return Err(self.reject(&RequestContext::background(), "context is nil"));
        };
        let Some(request) = request else {
            return Err(self.reject(ctx, "request is nil"));
        };
        self.call(ctx, request).await
    }

    /// Perform `request` under the context installed in the task-local store,
    /// or a background context if none is installed.
    pub async fn call_in_scope(&self, request: Request<Body>) -> ClientResult<CallResponse> {
        let ctx = context::current();
        self.call(&ctx, request).await
    }

    /// Perform `request`, recording it as one telemetry event.
    pub async fn call(
        &self,
        ctx: &RequestContext,
        request: Request<Body>,
    ) -> ClientResult<CallResponse> {
        let (parts, body) = request.into_parts();
        let mut record = CallRecord {
            method: parts.method.to_string(),
            url: compose_url(&parts.uri, self.compat),
            request_headers: header_pairs(&parts.headers),
            ..CallRecord::default()
        };

        let request_bytes = match capture(body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ClientError::Io(e);
                self.finish(ctx, record, Some(&err));
                return Err(err);
            }
        };
        record.request_body = body_text(&request_bytes);
        let request = Request::from_parts(parts, replay(&request_bytes));

        let start = Instant::now();
        let result = self.send(ctx, request).await;
        record.duration_ms = elapsed_ms(start);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                if self.compat == EventCompat::Legacy {
                    record.response_body = record.request_body.clone();
                }
                let err = ClientError::Transport(e);
                self.finish(ctx, record, Some(&err));
                return Err(err);
            }
        };

        let (parts, body) = response.into_parts();
        record.response_status = Some(parts.status.as_u16());
        record.response_headers = header_pairs(&parts.headers);

        let raw = match capture(body).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let err = ClientError::Io(e);
                self.finish(ctx, record, Some(&err));
                return Err(err);
            }
        };

        let decoded = if self.decompression == Decompression::Auto && is_gzip(&parts.headers) {
            match gunzip(&raw) {
                Ok(plain) => Bytes::from(plain),
                Err(e) => {
                    let err = ClientError::Decode(e);
                    self.finish(ctx, record, Some(&err));
                    return Err(err);
                }
            }
        } else {
            raw
        };
        record.response_body = body_text(&decoded);
        self.finish(ctx, record, None);

        Ok(CallResponse {
            status: parts.status,
            headers: parts.headers,
            body: decoded,
        })
    }

    async fn send(
        &self,
        ctx: &RequestContext,
        request: Request<Body>,
    ) -> Result<axum::http::Response<Body>, TransportError> {
        if let Some(done) = ctx.check() {
            return Err(done.into());
        }
        tokio::select! {
            biased;
            done = ctx.done() => Err(done.into()),
            result = self.transport.send(request) => result,
        }
    }

    fn reject(&self, ctx: &RequestContext, reason: &'static str) -> ClientError {
        let err = ClientError::Precondition(reason);
        self.finish(ctx, CallRecord::default(), Some(&err));
        err
    }

    fn finish(&self, ctx: &RequestContext, record: CallRecord, error: Option<&ClientError>) {
        let event = record.into_event(error).into();
        emit(self.sink.as_ref(), ctx, &event);
    }
}

/// Fields accumulated while a call progresses.
#[derive(Default)]
struct CallRecord {
    method: String,
    url: String,
    request_headers: HeaderPairs,
    request_body: String,
    response_status: Option<u16>,
    response_headers: HeaderPairs,
    response_body: String,
    duration_ms: u64,
}

impl CallRecord {
    fn into_event(self, error: Option<&ClientError>) -> HttpCallEvent {
        HttpCallEvent {
            operation: HTTP_CALL_OPERATION,
            method: self.method,
            url: self.url,
            request_headers: self.request_headers,
            request_body: self.request_body,
            response_status: self.response_status,
            response_headers: self.response_headers,
            response_body: self.response_body,
            duration_ms: self.duration_ms,
            error: error.map(ToString::to_string),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// URL string recorded in events.
fn compose_url(uri: &Uri, compat: EventCompat) -> String {
    let scheme = uri.scheme_str().unwrap_or("");
    let host = uri.authority().map(|a| a.as_str()).unwrap_or("");
    let path = uri.path();
    let query = uri.query().unwrap_or("");
    match compat {
        EventCompat::Legacy => format!("{}//{}{}{}", scheme, host, path, query),
        EventCompat::Standard => {
            let mut url = String::new();
            if !scheme.is_empty() {
                url.push_str(scheme);
                url.push_str("://");
            }
            url.push_str(host);
            url.push_str(path);
            if !query.is_empty() {
                url.push('?');
                url.push_str(query);
            }
            url
        }
    }
}
