//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Caches (hits and misses per namespace)
//! - External services (TMDB, indexers, AllDebrid)
//! - The stream pipeline and quota manager

use std::time::Instant;

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cache Metrics
// =============================================================================

/// Cache lookups by cache and result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaystream_cache_lookups_total", "Total cache lookups"),
        &["cache", "result"], // result: "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relaystream_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "relaystream_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error", "timeout"
    )
    .unwrap()
});

/// Raw candidates returned by indexers per search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relaystream_search_results",
            "Number of raw candidates returned per indexer search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0]),
        &["indexer"],
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Streams returned per query.
pub static STREAMS_RETURNED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "relaystream_streams_returned",
            "Number of streams returned per query",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0]),
        &["kind"],
    )
    .unwrap()
});

/// Unlock failures skipped by the pipeline.
pub static UNLOCK_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "relaystream_unlock_failures_total",
        "Total file unlocks that failed and were skipped",
    )
    .unwrap()
});

// =============================================================================
// Quota Metrics
// =============================================================================

/// Quota sweeps by outcome.
pub static QUOTA_SWEEPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("relaystream_quota_sweeps_total", "Total quota sweeps"),
        &["result"], // "under_limit", "deleted", "failed"
    )
    .unwrap()
});

/// Magnets deleted from the debrid account.
pub static QUOTA_DELETIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "relaystream_quota_deletions_total",
        "Total magnets deleted to stay under quota",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one external call's outcome and duration.
pub fn record_external_call(service: &str, operation: &str, status: &str, started: Instant) {
    EXTERNAL_SERVICE_REQUESTS
        .with_label_values(&[service, operation, status])
        .inc();
    EXTERNAL_SERVICE_DURATION
        .with_label_values(&[service, operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Caches
        Box::new(CACHE_LOOKUPS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        // Pipeline
        Box::new(STREAMS_RETURNED.clone()),
        Box::new(UNLOCK_FAILURES.clone()),
        // Quota
        Box::new(QUOTA_SWEEPS.clone()),
        Box::new(QUOTA_DELETIONS.clone()),
    ]
}
