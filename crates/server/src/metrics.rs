//! Prometheus metrics for observability.
//!
//! This module provides the HTTP-level metrics of the addon server and
//! registers them together with the pipeline metrics from the core crate.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relaystream_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaystream_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "relaystream_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Addon Metrics
// =============================================================================

/// Stream requests by media type and outcome.
pub static STREAM_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "relaystream_stream_requests_total",
            "Total addon stream requests",
        ),
        &["type", "outcome"], // outcome: "served", "empty", "invalid_config", "invalid_id"
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(STREAM_REQUESTS_TOTAL.clone()))
        .unwrap();

    // Core metrics (cache, external services, quota)
    for metric in relaystream_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

static CONFIG_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/[^/]+/(manifest\.json|stream/)").unwrap());

static CONTENT_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/tt\d+[^/]*$").unwrap());

/// Normalize a path for metric labels (replace user config and content ids
/// with placeholders).
pub fn normalize_path(path: &str) -> String {
    if path.starts_with("/api/") {
        return path.to_string();
    }
    let result = CONFIG_SEGMENT_RE.replace(path, "/{config}/$1");
    let result = CONTENT_ID_RE.replace(&result, "/{id}.json");
    result.to_string()
}
