//! Telemetry event definitions.

use axum::http::HeaderMap;
use serde::Serialize;

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

/// Header name/value pairs in wire order. Non-UTF-8 values are lossily decoded.
pub type HeaderPairs = Vec<(String, String)>;

/// Flatten a header map for logging.
pub fn header_pairs(headers: &HeaderMap) -> HeaderPairs {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

/// One completed outbound HTTP call attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HttpCallEvent {
    pub operation: &'static str,
    pub method: String,
    pub url: String,
    pub request_headers: HeaderPairs,
    pub request_body: String,
    /// Absent when the transport produced no response.
    pub response_status: Option<u16>,
    pub response_headers: HeaderPairs,
    pub response_body: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// One completed database call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DbCallEvent {
    pub operation: &'static str,
    pub query: String,
    /// Bound arguments rendered as a JSON array.
    pub args: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Structured record of a single call, success or failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TelemetryEvent {
    Http(HttpCallEvent),
    Db(DbCallEvent),
}

impl TelemetryEvent {
    pub fn operation(&self) -> &'static str {
        match self {
            TelemetryEvent::Http(e) => e.operation,
            TelemetryEvent::Db(e) => e.operation,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TelemetryEvent::Http(_) => "http",
            TelemetryEvent::Db(_) => "db",
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            TelemetryEvent::Http(e) => e.duration_ms,
            TelemetryEvent::Db(e) => e.duration_ms,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            TelemetryEvent::Http(e) => e.error.as_deref(),
            TelemetryEvent::Db(e) => e.error.as_deref(),
        }
    }

    /// Error when an error is attached, informational otherwise.
    pub fn severity(&self) -> Severity {
        if self.error().is_some() {
            Severity::Error
        } else {
            Severity::Info
        }
    }

    /// Flattened key/value attributes for sinks that take plain pairs.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = match self {
            TelemetryEvent::Http(e) => vec![
                ("http_method", e.method.clone()),
                ("request_url", e.url.clone()),
                ("request_headers", render_headers(&e.request_headers)),
                ("request_body", e.request_body.clone()),
                (
                    "response_status",
                    e.response_status.map(|s| s.to_string()).unwrap_or_default(),
                ),
                ("response_headers", render_headers(&e.response_headers)),
                ("response_body", e.response_body.clone()),
                ("duration_ms", e.duration_ms.to_string()),
            ],
            TelemetryEvent::Db(e) => vec![
                ("query", e.query.clone()),
                ("args", e.args.clone()),
                ("duration_ms", e.duration_ms.to_string()),
            ],
        };
        if let Some(err) = self.error() {
            fields.push(("error", err.to_string()));
        }
        fields
    }
}

impl From<HttpCallEvent> for TelemetryEvent {
    fn from(event: HttpCallEvent) -> Self {
        TelemetryEvent::Http(event)
    }
}

impl From<DbCallEvent> for TelemetryEvent {
    fn from(event: DbCallEvent) -> Self {
        TelemetryEvent::Db(event)
    }
}

/// Headers as a JSON array of `[name, value]` pairs.
pub(crate) fn render_headers(headers: &HeaderPairs) -> String {
    serde_json::to_string(
        &headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect::<Vec<_>>(),
    )
    .unwrap_or_default()
}
