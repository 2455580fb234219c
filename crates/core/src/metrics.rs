//! Prometheus metrics for core components.
//!
//! Registration happens in the server's registry; the statics here are
//! safe to touch from tests without a registry.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Generation pipeline
// =============================================================================

/// Generation batches by outcome.
pub static GENERATION_BATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scrollforge_generation_batches_total",
            "Total generation batches",
        ),
        &["outcome"], // "structured", "legacy_parse", "fallback"
    )
    .unwrap()
});

/// Items accepted per batch after dedup.
pub static GENERATION_ITEMS_ACCEPTED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scrollforge_generation_items_accepted",
            "Items accepted per generation batch after dedup",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 15.0, 20.0, 30.0, 40.0]),
        &[],
    )
    .unwrap()
});

/// Items dropped as duplicates per batch.
pub static GENERATION_ITEMS_DEDUPED: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scrollforge_generation_items_deduped",
            "Items dropped as exact duplicates per generation batch",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0]),
        &[],
    )
    .unwrap()
});

/// Generation call duration in seconds.
pub static GENERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scrollforge_generation_duration_seconds",
            "Duration of one generation call including persistence",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Feed pagination
// =============================================================================

/// Page requests by result.
pub static PAGE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scrollforge_page_requests_total", "Total page requests"),
        &["result"], // "served", "rate_limited", "not_found", "error"
    )
    .unwrap()
});

/// Times a caller waited out a concurrent generation instead of
/// generating.
pub static GENERATION_WAITS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scrollforge_generation_waits_total",
            "Page requests that waited for a concurrent generation",
        ),
        &[],
    )
    .unwrap()
});

/// Register all core metrics on the given registry.
pub fn register_core_metrics(registry: &prometheus::Registry) {
    let _ = registry.register(Box::new(GENERATION_BATCHES.clone()));
    let _ = registry.register(Box::new(GENERATION_ITEMS_ACCEPTED.clone()));
    let _ = registry.register(Box::new(GENERATION_ITEMS_DEDUPED.clone()));
    let _ = registry.register(Box::new(GENERATION_DURATION.clone()));
    let _ = registry.register(Box::new(PAGE_REQUESTS.clone()));
    let _ = registry.register(Box::new(GENERATION_WAITS.clone()));
}
