//! Per-provider rate limiting. Grounded directly in the
//! teacher's `services/rate_limiter.rs` `RateLimitedClient`: a `governor`
//! direct rate limiter behind an `until_ready` wait, generalised here to wrap
//! any `ProviderClient` rather than a bare `reqwest::Client`, and seeded from
//! the `provider_config` table instead of a hardcoded per-API constant.

use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use super::provider::{ProviderClient, ProviderMetadata, SearchResult};
use crate::error::Result;
use crate::models::provider_asset::CandidateAsset;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub requests_per_window: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        // TMDB's default tier: ~40 requests per 10 seconds.
        Self { requests_per_window: 40, window_secs: 10 }
    }
}

impl RateLimitConfig {
    fn quota(self) -> Quota {
        let per_second = (self.requests_per_window as f64 / self.window_secs.max(1) as f64).ceil() as u32;
        Quota::per_second(NonZeroU32::new(per_second.max(1)).unwrap())
            .allow_burst(NonZeroU32::new(self.requests_per_window.max(1)).unwrap())
    }
}

/// Wraps an inner `ProviderClient` so every call waits for a permit first.
pub struct RateLimitedClient<C: ProviderClient> {
    inner: C,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl<C: ProviderClient> RateLimitedClient<C> {
    pub fn new(inner: C, config: RateLimitConfig) -> Self {
        Self { inner, limiter: Arc::new(RateLimiter::direct(config.quota())) }
    }
}

#[async_trait]
impl<C: ProviderClient> ProviderClient for RateLimitedClient<C> {
    async fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>> {
        self.limiter.until_ready().await;
        self.inner.search(title, year).await
    }

    async fn fetch_metadata(&self, provider_id: i32) -> Result<ProviderMetadata> {
        self.limiter.until_ready().await;
        self.inner.fetch_metadata(provider_id).await
    }

    async fn fetch_assets(&self, provider_id: i32) -> Result<Vec<CandidateAsset>> {
        self.limiter.until_ready().await;
        self.inner.fetch_assets(provider_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_burst_matches_the_configured_window_size() {
        let cfg = RateLimitConfig { requests_per_window: 40, window_secs: 10 };
        let quota = cfg.quota();
        assert_eq!(quota.burst_size().get(), 40);
    }

    #[test]
    fn a_single_request_window_still_yields_a_valid_quota() {
        let cfg = RateLimitConfig { requests_per_window: 1, window_secs: 1 };
        assert_eq!(cfg.quota().burst_size().get(), 1);
    }
}
