//! Web search abstraction.
//!
//! This module provides a `Searcher` trait for keyword search backends and
//! the SerpAPI implementation used to find public profile pages.

mod serpapi;
mod types;

pub use serpapi::SerpApiSearcher;
pub use types::*;

use std::time::Duration;

use crate::metrics;
use crate::rate_limiter::RateLimiterPool;

/// Run one search through the shared rate limiter with a deadline.
///
/// Waiting for a rate-limit token does not count against `timeout`.
pub async fn paced_search(
    searcher: &dyn Searcher,
    limiter: &RateLimiterPool,
    query: &str,
    max_results: u32,
    timeout: Duration,
) -> Result<Vec<SearchHit>, SearchError> {
    limiter.acquire(searcher.name()).await;

    let result = match tokio::time::timeout(timeout, searcher.search(query, max_results)).await {
        Ok(result) => result,
        Err(_) => Err(SearchError::Timeout),
    };

    let outcome = match &result {
        Ok(hits) => {
            metrics::SEARCH_RESULTS.observe(hits.len() as f64);
            "success"
        }
        Err(e) if e.is_unavailable() => "unavailable",
        Err(_) => "error",
    };
    metrics::SEARCHES_TOTAL.with_label_values(&[outcome]).inc();

    result
}
