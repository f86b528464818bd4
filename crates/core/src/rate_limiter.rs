//! Token bucket rate limiter for per-provider pacing.
//!
//! Every external service (search engine, email providers) gets one bucket,
//! shared by all pipeline workers, so running organizations concurrently
//! never multiplies the request rate a provider sees.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration, Instant};
use tracing::debug;

/// Rate limit status for a provider.
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub requests_per_minute: u32,
    pub tokens_available: f32,
    pub next_available_in_ms: Option<u64>,
}

/// Token bucket rate limiter for a single provider.
///
/// Tokens are added at a constant rate and consumed when requests are made.
/// The capacity is the burst size: with a burst of 1 consecutive calls are
/// spaced evenly at `60 / rpm` seconds.
pub struct TokenBucket {
    /// Max tokens (burst size).
    capacity: f32,
    /// Current available tokens.
    tokens: f32,
    /// Tokens added per second.
    refill_rate: f32,
    /// Last refill time.
    last_refill: Instant,
}

impl TokenBucket {
    /// Create a bucket allowing `requests_per_minute` with bursts of up to
    /// `burst` requests. The bucket starts full.
    pub fn new(requests_per_minute: u32, burst: u32) -> Self {
        let capacity = burst.max(1) as f32;
        Self {
            capacity,
            tokens: capacity,
            refill_rate: requests_per_minute as f32 / 60.0,
            last_refill: Instant::now(),
        }
    }

    /// Try to acquire a token.
    ///
    /// Returns `Err(wait_duration)` if rate limited, with the duration to wait.
    pub fn try_acquire(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let tokens_needed = 1.0 - self.tokens;
            let wait_secs = tokens_needed / self.refill_rate;
            Err(Duration::from_secs_f32(wait_secs))
        }
    }

    /// Get the current rate limit status.
    pub fn status(&mut self) -> RateLimitStatus {
        self.refill();
        RateLimitStatus {
            requests_per_minute: (self.refill_rate * 60.0).round() as u32,
            tokens_available: self.tokens,
            next_available_in_ms: if self.tokens >= 1.0 {
                None
            } else {
                let tokens_needed = 1.0 - self.tokens;
                Some((tokens_needed / self.refill_rate * 1000.0) as u64)
            },
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f32();
        self.tokens = (self.tokens + elapsed * self.refill_rate).min(self.capacity);
        self.last_refill = now;
    }
}

/// Rate limit for one provider in the pool.
#[derive(Debug, Clone)]
pub struct ProviderRateLimit {
    /// Provider name, as returned by the client's `name()`.
    pub name: String,
    /// Max requests per minute. 0 disables limiting.
    pub rate_limit_rpm: u32,
}

/// Pool of rate limiters, one per provider.
///
/// Providers without a bucket are not limited.
pub struct RateLimiterPool {
    limiters: RwLock<HashMap<String, TokenBucket>>,
}

impl RateLimiterPool {
    /// Create a pool with strict pacing (burst of 1) for each provider.
    pub fn new(providers: &[ProviderRateLimit]) -> Self {
        let mut limiters = HashMap::new();
        for provider in providers.iter().filter(|p| p.rate_limit_rpm > 0) {
            limiters.insert(
                provider.name.clone(),
                TokenBucket::new(provider.rate_limit_rpm, 1),
            );
        }
        Self {
            limiters: RwLock::new(limiters),
        }
    }

    /// Create an empty rate limiter pool.
    pub fn empty() -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Add or replace a provider's bucket.
    pub async fn add_provider(&self, name: &str, rate_limit_rpm: u32, burst: u32) {
        let mut limiters = self.limiters.write().await;
        if rate_limit_rpm == 0 {
            limiters.remove(name);
        } else {
            limiters.insert(name.to_string(), TokenBucket::new(rate_limit_rpm, burst));
        }
    }

    /// Try to acquire a token without waiting.
    pub async fn try_acquire(&self, provider: &str) -> Result<(), Duration> {
        let mut limiters = self.limiters.write().await;
        match limiters.get_mut(provider) {
            Some(bucket) => bucket.try_acquire(),
            None => Ok(()),
        }
    }

    /// Wait until a token for `provider` is available, then take it.
    ///
    /// The lock is released while sleeping so other providers are not blocked.
    pub async fn acquire(&self, provider: &str) {
        loop {
            match self.try_acquire(provider).await {
                Ok(()) => return,
                Err(wait) => {
                    debug!(provider, wait_ms = wait.as_millis() as u64, "Pacing provider call");
                    sleep(wait).await;
                }
            }
        }
    }

    /// Get rate limit status for a specific provider.
    pub async fn get_status(&self, provider: &str) -> Option<RateLimitStatus> {
        let mut limiters = self.limiters.write().await;
        limiters.get_mut(provider).map(|bucket| bucket.status())
    }

    /// Check if a provider is limited by the pool.
    pub async fn has_provider(&self, provider: &str) -> bool {
        let limiters = self.limiters.read().await;
        limiters.contains_key(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_bucket_new() {
        let bucket = TokenBucket::new(60, 1);
        assert_eq!(bucket.capacity, 1.0);
        assert_eq!(bucket.tokens, 1.0);
        assert!((bucket.refill_rate - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_token_bucket_burst() {
        let mut bucket = TokenBucket::new(10, 3);

        for _ in 0..3 {
            assert!(bucket.try_acquire().is_ok());
        }

        // At 10 rpm, 1 token takes 6 seconds to refill
        let err = bucket.try_acquire().unwrap_err();
        assert!(err.as_secs() <= 6);
        assert!(err.as_millis() > 0);
    }

    #[test]
    fn test_token_bucket_status() {
        let mut bucket = TokenBucket::new(30, 1);

        let status = bucket.status();
        assert_eq!(status.requests_per_minute, 30);
        assert!(status.next_available_in_ms.is_none());

        bucket.try_acquire().unwrap();

        let status = bucket.status();
        assert!(status.tokens_available < 1.0);
        assert!(status.next_available_in_ms.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_refill() {
        let mut bucket = TokenBucket::new(60, 1);
        bucket.try_acquire().unwrap();
        assert!(bucket.try_acquire().is_err());

        tokio::time::advance(Duration::from_millis(1_001)).await;
        assert!(bucket.try_acquire().is_ok());
    }

    #[tokio::test]
    async fn test_pool_unknown_provider_is_unlimited() {
        let pool = RateLimiterPool::empty();
        for _ in 0..100 {
            assert!(pool.try_acquire("anything").await.is_ok());
        }
        assert!(!pool.has_provider("anything").await);
    }

    #[tokio::test]
    async fn test_pool_zero_rpm_disables_limit() {
        let pool = RateLimiterPool::new(&[ProviderRateLimit {
            name: "hunter".to_string(),
            rate_limit_rpm: 0,
        }]);
        assert!(!pool.has_provider("hunter").await);
    }

    #[tokio::test]
    async fn test_pool_providers_are_independent() {
        let pool = RateLimiterPool::new(&[
            ProviderRateLimit {
                name: "serpapi".to_string(),
                rate_limit_rpm: 60,
            },
            ProviderRateLimit {
                name: "anymail".to_string(),
                rate_limit_rpm: 60,
            },
        ]);

        assert!(pool.try_acquire("serpapi").await.is_ok());
        assert!(pool.try_acquire("serpapi").await.is_err());
        assert!(pool.try_acquire("anymail").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pool_acquire_waits_for_token() {
        let pool = RateLimiterPool::new(&[ProviderRateLimit {
            name: "serpapi".to_string(),
            rate_limit_rpm: 60,
        }]);

        let start = Instant::now();
        pool.acquire("serpapi").await;
        pool.acquire("serpapi").await;
        pool.acquire("serpapi").await;

        // Three calls at one per second: the first is immediate.
        assert!(start.elapsed() >= Duration::from_millis(1_900));
    }

    #[tokio::test]
    async fn test_pool_add_provider_replaces_bucket() {
        let pool = RateLimiterPool::empty();
        pool.add_provider("hunter", 10, 2).await;
        assert!(pool.has_provider("hunter").await);

        pool.add_provider("hunter", 20, 1).await;
        let status = pool.get_status("hunter").await.unwrap();
        assert_eq!(status.requests_per_minute, 20);

        pool.add_provider("hunter", 0, 1).await;
        assert!(!pool.has_provider("hunter").await);
    }
}
