//! Prometheus metrics: request tracking middleware and the exposition
//! endpoint.

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder. Must run once during startup,
/// before the first metric is recorded.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .set_buckets(&[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
        .expect("bucket list is non-empty")
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if RECORDER.set(handle).is_err() {
        panic!("init_metrics called twice");
    }
}

/// Labels every request with its method, matched route template and status,
/// and times it.
///
/// - `http_requests_total`: counter (method, path, status)
/// - `http_request_duration_seconds`: histogram (method, path)
pub async fn metrics_middleware(req: Request<Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().as_str().to_owned();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    let response = next.run(req).await;

    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "path" => route.clone(),
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "path" => route
    )
    .record(started.elapsed().as_secs_f64());

    response
}

/// Handler for `GET /metrics`, Prometheus text exposition format.
pub async fn metrics_handler() -> Response {
    match RECORDER.get() {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}
