//! Types for the web search system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One organic result returned by a search backend, in ranking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result title as displayed by the engine.
    #[serde(default)]
    pub title: String,
    /// Target URL of the result.
    #[serde(default)]
    pub link: String,
    /// Text excerpt shown under the title.
    #[serde(default)]
    pub snippet: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
        }
    }
}

/// Errors that can occur during search operations.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search backend connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Search backend API error: {0}")]
    ApiError(String),

    #[error("Search backend rejected the API key")]
    Unauthorized,

    #[error("Search backend quota exhausted")]
    QuotaExceeded,

    #[error("Search backend rate limited the request")]
    RateLimited,

    #[error("Request timeout")]
    Timeout,

    #[error("No search backend configured")]
    NotConfigured,
}

impl SearchError {
    /// Whether the backend itself could not serve the request (transport,
    /// auth, quota or pacing failure) as opposed to returning a malformed
    /// answer.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, SearchError::ApiError(_))
    }
}

/// Trait for keyword web search backends.
#[async_trait]
pub trait Searcher: Send + Sync {
    /// Provider name for logging and rate limiting.
    fn name(&self) -> &str;

    /// Run `query` and return at most `max_results` hits in ranking order.
    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError>;
}
