//! Service middleware and metric events.
//!
//! ## Request Correlation
//!
//! Every request runs inside a `record_token_request` span carrying a
//! request id. The id comes from `x-request-id`, then the Cloud Trace header,
//! and is otherwise generated. It is echoed back in `x-request-id`.
//!
//! ## Metrics Exposed
//!
//! Emitted as `tracing` events under `record_token::metrics`, aggregated
//! from logs:
//!
//! - `request_metric` - path, method, status, latency
//! - `token_issuance_metric` - outcome kind of each issuance
//! - `token_verification_metric` - verification result and reason code

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::{info, info_span, Instrument};

use crate::error::ErrorKind;

/// Header carrying the request correlation id, inbound and outbound.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const CLOUD_TRACE_HEADER: &str = "x-cloud-trace-context";
const MAX_REQUEST_ID_LEN: usize = 128;

const KNOWN_PATHS: &[&str] = &[
    "/api/token",
    "/api/verify_token",
    "/health",
    "/health/live",
    "/health/ready",
];

/// Run the request inside a correlation span and echo its id.
pub async fn correlation_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_from(request.headers());
    let span = info_span!(
        "record_token_request",
        request_id = %request_id,
        method = %request.method(),
        path = normalize_path(request.uri().path()),
    );

    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Caller-supplied id when usable, otherwise a fresh UUID.
fn request_id_from(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .or_else(|| headers.get(CLOUD_TRACE_HEADER))
        .and_then(|value| value.to_str().ok())
        // Cloud Trace format is TRACE_ID/SPAN_ID;o=OPTIONS
        .and_then(|value| value.split('/').next())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Metrics middleware that records request counts and latency.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = normalize_path(request.uri().path());

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status().as_u16();

    info!(
        target: "record_token::metrics",
        metric_type = "request",
        path = %path,
        method = %method,
        status = status,
        latency_ms = latency.as_millis() as u64,
        "request_metric"
    );

    response
}

/// Collapse unknown paths to keep metric cardinality bounded.
fn normalize_path(path: &str) -> &'static str {
    KNOWN_PATHS
        .iter()
        .find(|known| **known == path)
        .copied()
        .unwrap_or("/:unmatched")
}

/// Record the outcome of one issuance.
pub fn record_token_issuance(outcome: Result<(), ErrorKind>) {
    let result = match outcome {
        Ok(()) => "issued",
        Err(kind) => kind.as_str(),
    };
    info!(
        target: "record_token::metrics",
        metric_type = "token_issuance",
        result = result,
        "token_issuance_metric"
    );
}

/// Record token verification metrics.
pub fn record_token_verification(valid: bool, reason: Option<&str>) {
    let result = if valid { "valid" } else { "invalid" };
    info!(
        target: "record_token::metrics",
        metric_type = "token_verification",
        result = result,
        reason = reason.unwrap_or("none"),
        "token_verification_metric"
    );
}
