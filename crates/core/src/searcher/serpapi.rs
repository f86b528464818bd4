//! SerpAPI search backend implementation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::config::SerpApiConfig;
use crate::metrics;

use super::{SearchError, SearchHit, Searcher};

/// SerpAPI search backend (Google engine by default).
pub struct SerpApiSearcher {
    client: Client,
    config: SerpApiConfig,
}

impl SerpApiSearcher {
    /// Create a new SerpApiSearcher with the given configuration.
    pub fn new(config: SerpApiConfig) -> Result<Self, SearchError> {
        if config.api_key.trim().is_empty() {
            return Err(SearchError::NotConfigured);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| SearchError::ConnectionFailed(format!("HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search.json", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Searcher for SerpApiSearcher {
    fn name(&self) -> &str {
        "serpapi"
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        let start = Instant::now();
        debug!(query, max_results, "Searching SerpAPI");

        let num = max_results.to_string();
        let response = self
            .client
            .get(self.search_url())
            .query(&[
                ("q", query),
                ("engine", self.config.engine.as_str()),
                ("api_key", self.config.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout
                } else if e.is_connect() {
                    SearchError::ConnectionFailed(e.to_string())
                } else {
                    SearchError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, &body));
        }

        let data: SerpApiResponse = response
            .json()
            .await
            .map_err(|e| SearchError::ApiError(format!("Failed to parse response: {}", e)))?;

        // SerpAPI reports "no results" as an error message on a 200 response.
        if let Some(err) = data.error {
            if data.organic_results.is_empty() && !err.to_lowercase().contains("returned any results") {
                return Err(SearchError::ApiError(err));
            }
        }

        let hits: Vec<SearchHit> = data
            .organic_results
            .into_iter()
            .take(max_results as usize)
            .collect();

        metrics::SEARCH_LATENCY.observe(start.elapsed().as_secs_f64());
        debug!(results = hits.len(), "SerpAPI search complete");
        Ok(hits)
    }
}

fn map_status(status: StatusCode, body: &str) -> SearchError {
    match status {
        StatusCode::UNAUTHORIZED => SearchError::Unauthorized,
        StatusCode::PAYMENT_REQUIRED => SearchError::QuotaExceeded,
        StatusCode::TOO_MANY_REQUESTS => SearchError::RateLimited,
        StatusCode::FORBIDDEN if body.to_lowercase().contains("searches") => {
            SearchError::QuotaExceeded
        }
        StatusCode::FORBIDDEN => SearchError::Unauthorized,
        _ => SearchError::ApiError(format!(
            "HTTP {}: {}",
            status,
            body.chars().take(200).collect::<String>()
        )),
    }
}

#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<SearchHit>,
    #[serde(default)]
    error: Option<String>,
}
