//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Search (queries issued, results returned, latency)
//! - Email providers (attempts by outcome, latency, cache hits)
//! - Pipeline (candidates retained, organizations skipped, parse rejections)

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Search Metrics
// =============================================================================

/// Search queries issued by outcome.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scout_searches_total", "Total search queries issued"),
        &["outcome"], // "success", "unavailable", "error"
    )
    .unwrap()
});

/// Results returned per search query.
pub static SEARCH_RESULTS: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "scout_search_results",
            "Number of search results returned per query",
        )
        .buckets(vec![0.0, 1.0, 2.0, 5.0, 10.0, 20.0]),
    )
    .unwrap()
});

/// Search backend latency in seconds.
pub static SEARCH_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "scout_search_duration_seconds",
            "Duration of search backend calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
    )
    .unwrap()
});

// =============================================================================
// Email Provider Metrics
// =============================================================================

/// Provider attempts by provider, lookup mode and outcome.
pub static PROVIDER_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "scout_provider_attempts_total",
            "Total email provider attempts",
        ),
        // outcome: "success" or a miss reason
        &["provider", "mode", "outcome"],
    )
    .unwrap()
});

/// Provider call latency in seconds.
pub static PROVIDER_LATENCY: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "scout_provider_duration_seconds",
            "Duration of email provider calls",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0]),
        &["provider"],
    )
    .unwrap()
});

/// Resolution cache lookups by result.
pub static CACHE_LOOKUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scout_cache_lookups_total", "Total resolution cache lookups"),
        &["result"], // "hit", "miss"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Candidates retained per organization.
pub static CANDIDATES_RETAINED: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "scout_candidates_retained",
            "Number of candidates retained per organization",
        )
        .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 10.0, 20.0]),
    )
    .unwrap()
});

/// Organizations skipped as out of scope.
pub static ORGANIZATIONS_SKIPPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "scout_organizations_skipped_total",
        "Total organizations skipped by the targeting policy",
    )
    .unwrap()
});

/// Search hits dropped before becoming candidates, by reason.
pub static HITS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("scout_hits_rejected_total", "Total search hits rejected"),
        &["reason"], // "not_profile", "duplicate", "empty_name", "irrelevant"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Search
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(SEARCH_LATENCY.clone()),
        // Email providers
        Box::new(PROVIDER_ATTEMPTS.clone()),
        Box::new(PROVIDER_LATENCY.clone()),
        Box::new(CACHE_LOOKUPS.clone()),
        // Pipeline
        Box::new(CANDIDATES_RETAINED.clone()),
        Box::new(ORGANIZATIONS_SKIPPED.clone()),
        Box::new(HITS_REJECTED.clone()),
    ]
}
