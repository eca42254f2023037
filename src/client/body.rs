//! Body capture, replay and content decoding.
//!
//! A request body is a single-read stream. [`capture`] drains it into memory
//! and drops the original stream; [`replay`] builds a fresh stream over the
//! same bytes for the transport, so what is sent and what is logged are the
//! same buffer.

use std::io::{self, Read};

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, HeaderMap};
use flate2::read::MultiGzDecoder;

/// Drain `body` fully. The stream is consumed and dropped on every path.
pub async fn capture(body: Body) -> Result<Bytes, axum::Error> {
    if body.is_end_stream() {
        return Ok(Bytes::new());
    }
    axum::body::to_bytes(body, usize::MAX).await
}

/// A fresh body positioned at the start of `bytes`.
pub fn replay(bytes: &Bytes) -> Body {
    if bytes.is_empty() {
        Body::empty()
    } else {
        Body::from(bytes.clone())
    }
}

/// Lossy UTF-8 rendering for telemetry.
pub fn body_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Whether `Content-Encoding` mentions gzip, ignoring case.
pub fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("gzip"))
}

/// Decompress a gzip buffer of one or more concatenated members.
///
/// A truncated stream is tolerated: whatever plaintext was produced before the
/// input ran out is returned. Any other failure is an error.
pub fn gunzip(raw: &[u8]) -> io::Result<Vec<u8>> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    let mut decoder = MultiGzDecoder::new(raw);
    let mut plain = Vec::new();
    match decoder.read_to_end(&mut plain) {
        Ok(_) => Ok(plain),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(plain),
        Err(e) => Err(e),
    }
}
