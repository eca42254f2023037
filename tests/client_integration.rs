//! End-to-end tests for the instrumented client over a real socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use outbound_trace::client::{ClientError, EventCompat, InstrumentedClient, TransportError};
use outbound_trace::context::{self, RequestContext};
use outbound_trace::telemetry::{RecordingSink, Severity, TelemetryEvent};

mod common;

fn client_with_sink(timeout: Duration) -> (InstrumentedClient, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let client = InstrumentedClient::new(timeout, None)
        .unwrap()
        .with_sink(sink.clone());
    (client, sink)
}

fn only_http_event(sink: &RecordingSink) -> (Severity, outbound_trace::telemetry::HttpCallEvent) {
    let events = sink.events();
    assert_eq!(events.len(), 1, "expected exactly one event, got {:?}", events);
    match &events[0].event {
        TelemetryEvent::Http(e) => (events[0].severity, e.clone()),
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_echo_round_trip() {
    let addr = common::start_mock_backend().await;
    let (client, sink) = client_with_sink(Duration::from_secs(2));

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("http://{}/echo?debug=1", addr))
        .header("x-trace", "t-42")
        .body(Body::from("order=17&qty=3"))
        .unwrap();

    let response = client.call(&RequestContext::new(), request).await.unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.text(), "order=17&qty=3");
    assert_eq!(response.headers.get("x-echo-trace").unwrap(), "t-42");

    let (severity, event) = only_http_event(&sink);
    assert_eq!(severity, Severity::Info);
    assert_eq!(event.request_body, "order=17&qty=3");
    assert_eq!(event.response_body, "order=17&qty=3");
    assert_eq!(event.url, format!("http://{}/echo?debug=1", addr));
}

#[tokio::test]
async fn test_gzip_response_decoded() {
    let addr = common::start_mock_backend().await;
    let (client, sink) = client_with_sink(Duration::from_secs(2));

    let request = Request::get(format!("http://{}/gzip", addr))
        .body(Body::empty())
        .unwrap();
    let response = client.call(&RequestContext::new(), request).await.unwrap();

    assert_eq!(response.text(), common::GZIP_PLAINTEXT);
    let (_, event) = only_http_event(&sink);
    assert_eq!(event.response_body, common::GZIP_PLAINTEXT);
}

#[tokio::test]
async fn test_plain_response_untouched() {
    let addr = common::start_mock_backend().await;
    let (client, _sink) = client_with_sink(Duration::from_secs(2));

    let request = Request::get(format!("http://{}/plain", addr))
        .body(Body::empty())
        .unwrap();
    let response = client.call(&RequestContext::new(), request).await.unwrap();
    assert_eq!(&response.body[..], b"plain text");
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let addr = common::closed_port().await;
    let (client, sink) = client_with_sink(Duration::from_secs(2));
    let client = client.with_event_compat(EventCompat::Legacy);

    let request = Request::post(format!("http://{}/echo", addr))
        .body(Body::from("hello?"))
        .unwrap();
    let err = client.call(&RequestContext::new(), request).await.unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
    let (severity, event) = only_http_event(&sink);
    assert_eq!(severity, Severity::Error);
    assert!(event.response_headers.is_empty());
    assert_eq!(event.response_body, "hello?");
}

#[tokio::test]
async fn test_client_timeout() {
    let addr = common::start_mock_backend().await;
    let (client, sink) = client_with_sink(Duration::from_millis(200));

    let request = Request::get(format!("http://{}/slow", addr))
        .body(Body::empty())
        .unwrap();
    let err = client.call(&RequestContext::new(), request).await.unwrap_err();

    match err {
        ClientError::Transport(e) => assert!(e.is_timeout()),
        other => panic!("expected transport timeout, got {:?}", other),
    }
    let (severity, event) = only_http_event(&sink);
    assert_eq!(severity, Severity::Error);
    assert!(event.duration_ms >= 150);
}

#[tokio::test]
async fn test_context_deadline_shorter_than_client_timeout() {
    let addr = common::start_mock_backend().await;
    let (client, _sink) = client_with_sink(Duration::from_secs(10));
    let ctx = RequestContext::new().with_timeout(Duration::from_millis(100));

    let request = Request::get(format!("http://{}/slow", addr))
        .body(Body::empty())
        .unwrap();
    let err = client.call(&ctx, request).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Transport(TransportError::DeadlineExceeded)
    ));
}

#[tokio::test]
async fn test_scoped_context_reaches_event() {
    let addr = common::start_mock_backend().await;
    let (client, sink) = client_with_sink(Duration::from_secs(2));
    let ctx = RequestContext::background().with_request_id("cli-7");

    let request = Request::get(format!("http://{}/plain", addr))
        .body(Body::empty())
        .unwrap();
    context::scope(ctx, client.call_in_scope(request)).await.unwrap();

    assert_eq!(sink.events()[0].request_id.as_deref(), Some("cli-7"));
}

#[tokio::test]
async fn test_concurrent_calls_one_event_each() {
    let addr = common::start_mock_backend().await;
    let (client, sink) = client_with_sink(Duration::from_secs(2));

    let mut handles = Vec::new();
    for i in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let ctx = RequestContext::background().with_request_id(format!("req-{}", i));
            let request = Request::post(format!("http://{}/echo", addr))
                .body(Body::from(format!("body-{}", i)))
                .unwrap();
            let response = client.call(&ctx, request).await.unwrap();
            assert_eq!(response.text(), format!("body-{}", i));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let events = sink.events();
    assert_eq!(events.len(), 8);
    for recorded in events {
        let id = recorded.request_id.unwrap();
        let n = id.trim_start_matches("req-");
        match recorded.event {
            TelemetryEvent::Http(e) => assert_eq!(e.request_body, format!("body-{}", n)),
            other => panic!("unexpected event {:?}", other),
        }
    }
}
