//! Outbound transport abstraction and the default reqwest-backed transport.

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::client::error::{ClientError, TransportError};
use crate::client::tls::TlsPolicy;
use crate::config::effective_timeout;

/// Performs one request and returns the response head with a streaming body.
///
/// Returning `Err` means no response object exists.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: Request<Body>,
    ) -> impl Future<Output = Result<Response<Body>, TransportError>> + Send;
}

/// Transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Build a transport. A zero `timeout` selects the 5 second default.
    ///
    /// TLS always goes through rustls, with or without a policy.
    pub fn new(timeout: Duration, tls: Option<&TlsPolicy>) -> Result<Self, ClientError> {
        let timeout = effective_timeout(timeout);
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(timeout);
        if let Some(policy) = tls {
            builder = policy.apply(builder)?;
        }
        let inner = builder
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;
        Ok(Self { inner, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: Request<Body>) -> Result<Response<Body>, TransportError> {
        let (parts, body) = request.into_parts();
        let url = url::Url::parse(&parts.uri.to_string())
            .map_err(|e| TransportError::InvalidRequest(format!("{}: {}", parts.uri, e)))?;
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = self
            .inner
            .request(parts.method, url)
            .headers(parts.headers)
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError::Timeout(self.timeout)
                } else {
                    TransportError::Http(e)
                }
            })?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());
        if let Some(headers) = builder.headers_mut() {
            *headers = response.headers().clone();
        }
        builder
            .body(Body::from_stream(response.bytes_stream()))
            .map_err(|e| TransportError::Other(e.to_string()))
    }
}
