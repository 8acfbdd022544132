//! Identify/enrich orchestrator (component J).
//!
//! Grounded in the teacher's provider-client shape (an async trait behind a
//! `reqwest::Client`, the way `services/ffmpeg.rs` wraps a subprocess behind
//! a trait) applied here to an HTTP metadata provider instead.

mod provider;
mod ratelimit;
mod retry;
mod scoring;
mod similarity;
mod tmdb;

pub use provider::{ProviderClient, ProviderMetadata, SearchResult};
pub use ratelimit::{RateLimitConfig, RateLimitedClient};
pub use retry::{retry_async, RetryConfig};
pub use scoring::score_asset;
pub use similarity::title_similarity;
pub use tmdb::TmdbClient;

use crate::error::Result;
use crate::models::provider_asset::CandidateAsset;

/// `identify`: given a filename-derived title and year, finds the best
/// matching provider id. Returns `None` when no candidate clears the
/// similarity floor (the caller leaves the movie `Unidentified`). An exact
/// year match outranks title similarity alone, so two same-named candidates
/// from different years don't tie.
pub async fn identify(client: &dyn ProviderClient, title: &str, year: Option<i32>) -> Result<Option<i32>> {
    let candidates = client.search(title, year).await?;
    let best = candidates
        .into_iter()
        .map(|c| {
            let similarity = title_similarity(title, &c.title);
            let year_matches = matches!((year, c.year), (Some(a), Some(b)) if a == b);
            (similarity, year_matches, c)
        })
        .filter(|(score, _, _)| *score >= similarity::MATCH_FLOOR)
        .max_by(|(score_a, year_a, _), (score_b, year_b, _)| {
            year_a.cmp(year_b).then_with(|| score_a.partial_cmp(score_b).unwrap_or(std::cmp::Ordering::Equal))
        });

    Ok(best.map(|(_, _, c)| c.provider_id))
}

/// `enrich`: fetches full metadata plus candidate assets for an already
/// identified movie.
pub async fn enrich(client: &dyn ProviderClient, provider_id: i32) -> Result<(ProviderMetadata, Vec<CandidateAsset>)> {
    let metadata = client.fetch_metadata(provider_id).await?;
    let assets = client.fetch_assets(provider_id).await?;
    Ok((metadata, assets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use provider::SearchResult;

    struct FakeClient {
        results: Vec<SearchResult>,
    }

    #[async_trait]
    impl ProviderClient for FakeClient {
        async fn search(&self, _title: &str, _year: Option<i32>) -> Result<Vec<SearchResult>> {
            Ok(self.results.clone())
        }

        async fn fetch_metadata(&self, _provider_id: i32) -> Result<ProviderMetadata> {
            unimplemented!()
        }

        async fn fetch_assets(&self, _provider_id: i32) -> Result<Vec<CandidateAsset>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn identify_picks_the_closest_title_match() {
        let client = FakeClient {
            results: vec![
                SearchResult { provider_id: 1, title: "Inception 2".to_string(), year: Some(2018) },
                SearchResult { provider_id: 27205, title: "Inception".to_string(), year: Some(2010) },
            ],
        };
        let id = identify(&client, "Inception", Some(2010)).await.unwrap();
        assert_eq!(id, Some(27205));
    }

    #[tokio::test]
    async fn identify_prefers_exact_year_match_over_title_similarity_alone() {
        let client = FakeClient {
            results: vec![
                SearchResult { provider_id: 1, title: "Total Recall".to_string(), year: Some(1990) },
                SearchResult { provider_id: 2, title: "Total Recall".to_string(), year: Some(2012) },
            ],
        };
        let id = identify(&client, "Total Recall", Some(2012)).await.unwrap();
        assert_eq!(id, Some(2));
    }

    #[tokio::test]
    async fn identify_returns_none_below_the_similarity_floor() {
        let client = FakeClient {
            results: vec![SearchResult { provider_id: 1, title: "Completely Different Film".to_string(), year: None }],
        };
        let id = identify(&client, "Inception", Some(2010)).await.unwrap();
        assert_eq!(id, None);
    }
}
