//! Shared utilities for integration tests.

use std::io::Write;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::net::TcpListener;

pub const GZIP_PLAINTEXT: &str = "compressed payload from the mock backend";

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

async fn echo(headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let trace = headers
        .get("x-trace")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    ([("x-echo-trace", trace)], body)
}

async fn gzipped() -> impl IntoResponse {
    ([(header::CONTENT_ENCODING, "gzip")], gzip(GZIP_PLAINTEXT.as_bytes()))
}

async fn slow() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3)).await;
    "too late"
}

/// Start a mock backend on an ephemeral loopback port.
pub async fn start_mock_backend() -> SocketAddr {
    let app = Router::new()
        .route("/echo", post(echo))
        .route("/gzip", get(gzipped))
        .route("/slow", get(slow))
        .route("/plain", get(|| async { "plain text" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address with nothing listening on it.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
