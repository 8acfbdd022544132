//! Repository layer (component F): a typed wrapper over SQLite.
//!
//! Grounded in the teacher's `db/mod.rs` (a `Database` struct exposing one
//! accessor per entity) and `db/sqlite_helpers.rs` (TEXT-encoded ids/JSON for
//! SQLite's lack of native UUID/array/JSONB columns).

pub mod activity_log;
pub mod cache_files;
pub mod jobs;
pub mod library_files;
pub mod media_players;
pub mod movies;
pub mod provider_assets;
pub mod provider_config;
pub mod settings;
pub mod sqlite_helpers;
pub mod unknown_files;

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error::Result;

/// Holds the pool and hands out per-entity repositories, mirroring the
/// teacher's `Database::torrents()`-style accessor pattern.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wraps an already-open pool (in-memory SQLite in scenario tests, a pool
    /// built with non-default options elsewhere).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn movies(&self) -> movies::MovieRepository {
        movies::MovieRepository::new(self.pool.clone())
    }

    pub fn cache_files(&self) -> cache_files::CacheFileRepository {
        cache_files::CacheFileRepository::new(self.pool.clone())
    }

    pub fn unknown_files(&self) -> unknown_files::UnknownFileRepository {
        unknown_files::UnknownFileRepository::new(self.pool.clone())
    }

    pub fn jobs(&self) -> jobs::JobRepository {
        jobs::JobRepository::new(self.pool.clone())
    }

    pub fn activity_log(&self) -> activity_log::ActivityLogRepository {
        activity_log::ActivityLogRepository::new(self.pool.clone())
    }

    pub fn media_players(&self) -> media_players::MediaPlayerRepository {
        media_players::MediaPlayerRepository::new(self.pool.clone())
    }

    pub fn settings(&self) -> settings::SettingsRepository {
        settings::SettingsRepository::new(self.pool.clone())
    }

    pub fn provider_config(&self) -> provider_config::ProviderConfigRepository {
        provider_config::ProviderConfigRepository::new(self.pool.clone())
    }

    pub fn provider_assets(&self) -> provider_assets::ProviderAssetRepository {
        provider_assets::ProviderAssetRepository::new(self.pool.clone())
    }

    pub fn library_files(&self) -> library_files::LibraryFileRepository {
        library_files::LibraryFileRepository::new(self.pool.clone())
    }
}
