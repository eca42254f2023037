//! `outbound-trace` command line client.
//!
//! Performs one instrumented HTTP request and prints the decoded response.
//! The call is logged through the same telemetry pipeline a service would use.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Method, Request};
use clap::Parser;

use outbound_trace::config::{load_config, AppConfig};
use outbound_trace::context::{self, RequestContext};
use outbound_trace::telemetry::logging::init_logging;
use outbound_trace::telemetry::metrics::init_metrics;
use outbound_trace::telemetry::{MetricsSink, TracingSink};
use outbound_trace::InstrumentedClient;

#[derive(Parser)]
#[command(name = "outbound-trace")]
#[command(about = "Send one instrumented HTTP request", long_about = None)]
struct Cli {
    /// Target URL.
    url: String,

    /// Configuration file (TOML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short = 'X', long, default_value = "GET")]
    method: String,

    /// Request header, `name: value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Request ID to attach to the context.
    #[arg(long)]
    request_id: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability);

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let client = InstrumentedClient::from_config(&config.client)?
        .with_sink(Arc::new(MetricsSink::new(TracingSink)));

    let mut builder = Request::builder()
        .method(Method::from_bytes(cli.method.to_uppercase().as_bytes())?)
        .uri(cli.url.as_str());
    for raw in &cli.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("malformed header '{}', expected 'name: value'", raw))?;
        builder = builder.header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    let request = builder.body(cli.data.map(Body::from).unwrap_or_else(Body::empty))?;

    let ctx = match cli.request_id {
        Some(id) => RequestContext::background().with_request_id(id),
        None => RequestContext::new(),
    };
    let response = context::scope(ctx, client.call_in_scope(request)).await?;

    println!("{}", response.status);
    println!("{}", response.text());
    Ok(())
}
