//! TMDB-backed `ProviderClient`. Grounded in the teacher's `services/ffmpeg.rs`
//! trait-behind-a-process idiom, here fronting an HTTP API instead of a
//! subprocess: a thin `reqwest::Client` wrapper, deserialized into local
//! structs, then converted to the crate's provider-neutral types.

use async_trait::async_trait;
use serde::Deserialize;

use super::provider::{ProviderClient, ProviderMetadata, SearchResult};
use super::retry::{retry_async, RetryConfig};
use crate::error::Result;
use crate::models::provider_asset::CandidateAsset;
use crate::models::slot::Slot;

const BASE_URL: &str = "https://api.themoviedb.org/3";

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    retry: RetryConfig,
}

impl TmdbClient {
    pub fn new(api_key: String) -> Self {
        Self { http: reqwest::Client::new(), api_key, retry: RetryConfig::default() }
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    id: i32,
    title: String,
    release_date: Option<String>,
}

#[derive(Deserialize)]
struct MovieDetails {
    id: i32,
    title: String,
    original_title: Option<String>,
    tagline: Option<String>,
    overview: Option<String>,
    runtime: Option<i32>,
    release_date: Option<String>,
    vote_average: Option<f64>,
    imdb_id: Option<String>,
    genres: Vec<NamedRef>,
    production_companies: Vec<NamedRef>,
}

#[derive(Deserialize)]
struct NamedRef {
    name: String,
}

#[derive(Deserialize)]
struct ImagesResponse {
    posters: Vec<ImageHit>,
    backdrops: Vec<ImageHit>,
}

#[derive(Deserialize)]
struct ImageHit {
    file_path: String,
    width: u32,
    height: u32,
    iso_639_1: Option<String>,
    vote_average: Option<f64>,
}

#[async_trait]
impl ProviderClient for TmdbClient {
    async fn search(&self, title: &str, year: Option<i32>) -> Result<Vec<SearchResult>> {
        let parsed: SearchResponse = retry_async(
            || async {
                let mut req = self
                    .http
                    .get(format!("{BASE_URL}/search/movie"))
                    .query(&[("api_key", self.api_key.as_str()), ("query", title)]);
                if let Some(year) = year {
                    req = req.query(&[("year", year.to_string())]);
                }
                Ok(req.send().await?.error_for_status()?.json().await?)
            },
            &self.retry,
            "tmdb.search",
        )
        .await?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| SearchResult {
                provider_id: r.id,
                title: r.title,
                year: r.release_date.as_deref().and_then(|d| d.get(0..4)).and_then(|y| y.parse().ok()),
            })
            .collect())
    }

    async fn fetch_metadata(&self, provider_id: i32) -> Result<ProviderMetadata> {
        let details: MovieDetails = retry_async(
            || async {
                Ok(self
                    .http
                    .get(format!("{BASE_URL}/movie/{provider_id}"))
                    .query(&[("api_key", self.api_key.as_str())])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?)
            },
            &self.retry,
            "tmdb.fetch_metadata",
        )
        .await?;

        Ok(ProviderMetadata {
            provider_id: details.id,
            title: details.title,
            original_title: details.original_title,
            tagline: details.tagline,
            plot: details.overview,
            runtime_minutes: details.runtime,
            release_date: details.release_date.as_deref().and_then(|d| d.parse().ok()),
            content_rating: None,
            provider_rating: details.vote_average,
            imdb_id: details.imdb_id,
            genres: details.genres.into_iter().map(|g| g.name).collect(),
            studios: details.production_companies.into_iter().map(|c| c.name).collect(),
        })
    }

    async fn fetch_assets(&self, provider_id: i32) -> Result<Vec<CandidateAsset>> {
        let images: ImagesResponse = retry_async(
            || async {
                Ok(self
                    .http
                    .get(format!("{BASE_URL}/movie/{provider_id}/images"))
                    .query(&[("api_key", self.api_key.as_str())])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?)
            },
            &self.retry,
            "tmdb.fetch_assets",
        )
        .await?;

        let mut assets = Vec::new();
        for hit in images.posters {
            assets.push(to_candidate(hit, Slot::Poster));
        }
        for hit in images.backdrops {
            assets.push(to_candidate(hit, Slot::Fanart));
        }
        Ok(assets)
    }
}

fn to_candidate(hit: ImageHit, slot: Slot) -> CandidateAsset {
    CandidateAsset {
        slot,
        provider_name: "tmdb".to_string(),
        provider_url: format!("https://image.tmdb.org/t/p/original{}", hit.file_path),
        width: Some(hit.width),
        height: Some(hit.height),
        language: hit.iso_639_1,
        vote_average: hit.vote_average,
        perceptual_hash: None,
    }
}
