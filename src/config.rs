//! Application configuration, loaded from environment variables.
//!
//! Mirrors the teacher's `Config::from_env` idiom: everything has a sane
//! development default so the worker can boot against a scratch data dir
//! without a `.env` file.

use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the on-disk layout; cache lives at `{data_dir}/cache/...`.
    pub data_dir: String,

    /// SQLite connection string, e.g. `sqlite://./data/curator.db`.
    pub database_url: String,

    /// TMDB-compatible provider API key.
    pub tmdb_api_key: Option<String>,

    /// Number of job-queue worker tasks.
    pub worker_count: usize,

    /// Poll interval for `pick_next`, in seconds (default 5s).
    pub poll_interval_secs: u64,

    /// Soft-delete retention window in days (default 30).
    pub retention_days: i64,

    /// Perceptual-hash dedup threshold (Hamming distance over a 64-bit dHash).
    pub phash_distance: u32,

    /// `phase.*` feature toggles, flattened for convenience.
    pub auto_enrich: bool,
    pub auto_publish: bool,
    pub fetch_provider_assets: bool,
    pub auto_select_assets: bool,
    pub unknown_files_auto_recycle: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            data_dir: env::var("CURATOR_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://./data/curator.db".to_string()),

            tmdb_api_key: env::var("TMDB_API_KEY").ok(),

            worker_count: env::var("CURATOR_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),

            poll_interval_secs: env::var("CURATOR_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            retention_days: env::var("CURATOR_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),

            phash_distance: env::var("CURATOR_PHASH_DISTANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),

            auto_enrich: bool_env("CURATOR_AUTO_ENRICH", true),
            auto_publish: bool_env("CURATOR_AUTO_PUBLISH", false),
            fetch_provider_assets: bool_env("CURATOR_FETCH_PROVIDER_ASSETS", true),
            auto_select_assets: bool_env("CURATOR_AUTO_SELECT_ASSETS", true),
            unknown_files_auto_recycle: bool_env("CURATOR_UNKNOWN_FILES_AUTO_RECYCLE", false),
        })
    }

    pub fn cache_root(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("cache")
    }
}

fn bool_env(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(default)
}

#[allow(dead_code)]
fn require(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} is required"))
}
