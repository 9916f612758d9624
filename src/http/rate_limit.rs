//! Client-side request pacing
//!
//! A token bucket shared by every request of one client. Calls that find
//! the bucket empty wait for the next token instead of failing.

use governor::{DefaultDirectRateLimiter, Quota};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::trace;

/// Requests per second and burst allowance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Evenly spaced requests with no burst
    pub fn steady(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, 1)
    }

    // Zero is clamped to one in both dimensions
    fn quota(self) -> Quota {
        let rate = NonZeroU32::new(self.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(self.burst_size).unwrap_or(NonZeroU32::MIN);
        Quota::per_second(rate).allow_burst(burst)
    }
}

/// Shared token bucket; clones draw from the same bucket
#[derive(Clone)]
pub struct RateLimiter {
    bucket: Arc<DefaultDirectRateLimiter>,
    config: RateLimiterConfig,
}

impl RateLimiter {
    pub fn new(config: &RateLimiterConfig) -> Self {
        Self {
            bucket: Arc::new(DefaultDirectRateLimiter::direct(config.quota())),
            config: *config,
        }
    }

    /// Take a token, waiting for one if the bucket is empty
    pub async fn wait(&self) {
        if self.bucket.check().is_ok() {
            return;
        }
        trace!(
            requests_per_second = self.config.requests_per_second,
            "Request paced"
        );
        self.bucket.until_ready().await;
    }

    /// Take a token only if one is available now
    pub fn try_acquire(&self) -> bool {
        self.bucket.check().is_ok()
    }

    pub fn config(&self) -> RateLimiterConfig {
        self.config
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_ten_per_second() {
        assert_eq!(RateLimiterConfig::default(), RateLimiterConfig::new(10, 10));
        assert_eq!(RateLimiterConfig::steady(3).burst_size, 1);
    }

    #[test]
    fn test_burst_is_exhausted() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(10, 4));
        let granted = (0..6).filter(|_| limiter.try_acquire()).count();
        assert_eq!(granted, 4);
    }

    #[test]
    fn test_clones_share_bucket() {
        let limiter = RateLimiter::new(&RateLimiterConfig::steady(1));
        let clone = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
        assert_eq!(clone.config().requests_per_second, 1);
    }

    #[test]
    fn test_zero_config_is_clamped() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[tokio::test]
    async fn test_wait_within_burst_returns() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(100, 2));
        limiter.wait().await;
        limiter.wait().await;
    }
}
