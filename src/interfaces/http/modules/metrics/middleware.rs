//! HTTP request metrics middleware
//!
//! Records `http_requests_total` (counter) and
//! `http_request_duration_seconds` (histogram) per route template.
//! Scrapes of `/metrics` itself are not recorded.

use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};

/// Label for requests that matched no route, so random paths cannot blow
/// up label cardinality.
const UNMATCHED_PATH: &str = "unmatched";

fn route_label(request: &Request<Body>) -> Option<String> {
    match request.extensions().get::<MatchedPath>() {
        Some(mp) if mp.as_str() == "/metrics" => None,
        Some(mp) => Some(mp.as_str().to_string()),
        None => Some(UNMATCHED_PATH.to_string()),
    }
}

pub async fn http_metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let Some(path) = route_label(&request) else {
        return next.run(request).await;
    };
    let method = request.method().to_string();

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    metrics::counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    metrics::histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(duration);

    response
}
