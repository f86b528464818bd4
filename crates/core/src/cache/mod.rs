//! Resolution cache.
//!
//! Remembers the outcome of every email resolution, including misses, so
//! paid providers are not asked the same question twice within the TTL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry freshness window in seconds (default: 24 hours).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Case-insensitive `(person, organization)` key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(person: &str, organization: &str) -> Self {
        Self(format!(
            "{}|{}",
            person.trim().to_lowercase(),
            organization.trim().to_lowercase()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remembered resolution outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResolution {
    /// Verified address, `None` for a miss.
    pub email: Option<String>,
    pub confidence: f64,
    /// Provider that produced the address.
    pub provider: Option<String>,
    /// Why the resolution missed, if it did.
    pub error: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl CachedResolution {
    pub fn found(email: impl Into<String>, confidence: f64, provider: impl Into<String>) -> Self {
        Self {
            email: Some(email.into()),
            confidence,
            provider: Some(provider.into()),
            error: None,
            cached_at: Utc::now(),
        }
    }

    pub fn missed(error: impl Into<String>) -> Self {
        Self {
            email: None,
            confidence: 0.0,
            provider: None,
            error: Some(error.into()),
            cached_at: Utc::now(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.email.is_some()
    }
}

/// Process-wide store of resolution outcomes. Implementations must be safe
/// for concurrent readers and writers.
#[async_trait]
pub trait ResolutionCache: Send + Sync {
    /// A fresh entry for `key`, or `None` if absent or expired.
    async fn get(&self, key: &CacheKey) -> Option<CachedResolution>;

    /// Store or replace the entry for `key`.
    async fn set(&self, key: CacheKey, value: CachedResolution);
}

struct Entry {
    value: CachedResolution,
    stored_at: Instant,
}

/// In-memory cache with TTL expiry. Expired entries are never returned and
/// are replaced on the next write for the same key.
pub struct MemoryResolutionCache {
    entries: RwLock<HashMap<CacheKey, Entry>>,
    ttl: Duration,
}

impl Default for MemoryResolutionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl MemoryResolutionCache {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_ttl(Duration::from_secs(config.ttl_secs))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ResolutionCache for MemoryResolutionCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedResolution> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() <= self.ttl)
            .map(|e| e.value.clone())
    }

    async fn set(&self, key: CacheKey, value: CachedResolution) {
        self.entries.write().await.insert(
            key,
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(
            CacheKey::new("  Jane DOE ", "Acme Partners "),
            CacheKey::new("jane doe", "acme partners")
        );
        assert_eq!(CacheKey::new("Jane", "Acme").as_str(), "jane|acme");
        assert_ne!(CacheKey::new("Jane", "Acme"), CacheKey::new("Jane", "Beta"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let cache = MemoryResolutionCache::default();
        assert!(cache.get(&CacheKey::new("a", "b")).await.is_none());
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = MemoryResolutionCache::default();
        let key = CacheKey::new("Jane Doe", "Acme");
        cache
            .set(key.clone(), CachedResolution::found("jane@acme.com", 0.9, "anymail"))
            .await;

        let hit = cache.get(&CacheKey::new("JANE DOE", " acme")).await.unwrap();
        assert_eq!(hit.email.as_deref(), Some("jane@acme.com"));
        assert_eq!(hit.provider.as_deref(), Some("anymail"));
        assert!(hit.is_found());
    }

    #[tokio::test]
    async fn test_negative_results_are_cached() {
        let cache = MemoryResolutionCache::default();
        let key = CacheKey::new("Nobody", "Acme");
        cache.set(key.clone(), CachedResolution::missed("not found")).await;

        let hit = cache.get(&key).await.unwrap();
        assert!(!hit.is_found());
        assert_eq!(hit.confidence, 0.0);
        assert_eq!(hit.error.as_deref(), Some("not found"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryResolutionCache::new(CacheConfig { ttl_secs: 60 });
        let key = CacheKey::new("Jane", "Acme");
        cache
            .set(key.clone(), CachedResolution::found("jane@acme.com", 0.9, "hunter"))
            .await;

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(cache.get(&key).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(cache.get(&key).await.is_none());
        // Still stored; only treated as absent.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(MemoryResolutionCache::default());
        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = CacheKey::new(&format!("person {}", i % 4), "Acme");
                cache.set(key.clone(), CachedResolution::missed("none")).await;
                cache.get(&key).await.is_some()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap());
        }
        assert_eq!(cache.len().await, 4);
    }
}
