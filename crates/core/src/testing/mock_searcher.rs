//! Mock searcher for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::searcher::{SearchError, SearchHit, Searcher};

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    /// The query that was searched.
    pub query: String,
    /// The result cap the caller asked for.
    pub max_results: u32,
    /// When the search was made.
    pub timestamp: Instant,
}

/// A query handler that produces results dynamically based on the query.
type QueryHandler = Box<dyn Fn(&str) -> Option<Vec<SearchHit>> + Send + Sync>;

/// Mock implementation of the Searcher trait.
///
/// Provides controllable behavior for testing:
/// - Return scripted hits per exact query, or from a query handler
/// - Track search queries for assertions
/// - Simulate failures and delays
///
/// # Example
///
/// ```rust,ignore
/// use scout_core::testing::{MockSearcher, fixtures};
///
/// let searcher = MockSearcher::new();
/// searcher
///     .add_response(
///         "\"HR Director\" \"Acme Partners\" site:linkedin.com/in",
///         vec![fixtures::profile_hit("Jane Doe", "HR Director", "Acme Partners", "jane-doe")],
///     )
///     .await;
///
/// let queries = searcher.recorded_queries().await;
/// ```
pub struct MockSearcher {
    name: String,
    /// Hits returned for an exact query string.
    responses: Arc<RwLock<HashMap<String, Vec<SearchHit>>>>,
    /// Recorded search queries.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search will fail with this error.
    next_error: Arc<RwLock<Option<SearchError>>>,
    /// Query handler for dynamic result generation based on query string.
    query_handler: Arc<RwLock<Option<QueryHandler>>>,
    /// Simulated latency per search.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl std::fmt::Debug for MockSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSearcher")
            .field("name", &self.name)
            .field("responses", &"<responses>")
            .field("searches", &"<searches>")
            .field("next_error", &"<next_error>")
            .field("query_handler", &"<handler>")
            .finish()
    }
}

impl Default for MockSearcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearcher {
    /// Create a new mock searcher that returns no hits.
    pub fn new() -> Self {
        Self::named("mock-search")
    }

    /// Create a mock searcher reporting a custom backend name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            responses: Arc::new(RwLock::new(HashMap::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            query_handler: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Return `hits` whenever exactly `query` is searched.
    pub async fn add_response(&self, query: &str, hits: Vec<SearchHit>) {
        self.responses.write().await.insert(query.to_string(), hits);
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get recorded query strings in call order.
    pub async fn recorded_queries(&self) -> Vec<String> {
        self.searches
            .read()
            .await
            .iter()
            .map(|s| s.query.clone())
            .collect()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: SearchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Delay every search by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Set a query handler that dynamically generates hits from the query
    /// string.
    ///
    /// The handler runs before exact-query responses; returning `None` falls
    /// through to them.
    pub async fn set_query_handler<F>(&self, handler: F)
    where
        F: Fn(&str) -> Option<Vec<SearchHit>> + Send + Sync + 'static,
    {
        *self.query_handler.write().await = Some(Box::new(handler));
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<SearchError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl Searcher for MockSearcher {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, query: &str, max_results: u32) -> Result<Vec<SearchHit>, SearchError> {
        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        // Check for injected error
        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        self.searches.write().await.push(RecordedSearch {
            query: query.to_string(),
            max_results,
            timestamp: Instant::now(),
        });

        let handled = {
            let handler = self.query_handler.read().await;
            handler.as_ref().and_then(|h| h(query))
        };
        let hits = match handled {
            Some(hits) => hits,
            None => self
                .responses
                .read()
                .await
                .get(query)
                .cloned()
                .unwrap_or_default(),
        };

        Ok(hits.into_iter().take(max_results as usize).collect())
    }
}
