//! Provider boundary trait: abstracts over a
//! TMDB-like metadata service so `identify`/`enrich` can be tested against a
//! fake without touching the network.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::provider_asset::CandidateAsset;

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub provider_id: i32,
    pub title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub provider_id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub tagline: Option<String>,
    pub plot: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub release_date: Option<chrono::NaiveDate>,
    pub content_rating: Option<String>,
    pub provider_rating: Option<f64>,
    pub imdb_id: Option<String>,
    pub genres: Vec<String>,
    pub studios: Vec<String>,
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>>;
    async fn fetch_metadata(&self, provider_id: i32) -> Result<ProviderMetadata>;
    async fn fetch_assets(&self, provider_id: i32) -> Result<Vec<CandidateAsset>>;
}
