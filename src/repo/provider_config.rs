//! Provider rate-limit configuration (): seeds the
//! in-process `governor` limiter for each metadata provider at startup.

use sqlx::{Row, SqlitePool};

use crate::error::Result;

#[derive(Debug, Clone, Copy)]
pub struct ProviderRateLimit {
    pub requests_per_window: u32,
    pub window_secs: u64,
}

pub struct ProviderConfigRepository {
    pool: SqlitePool,
}

impl ProviderConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, provider_name: &str) -> Result<Option<ProviderRateLimit>> {
        let row = sqlx::query("SELECT requests_per_window, window_secs FROM provider_config WHERE provider_name = ?")
            .bind(provider_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| ProviderRateLimit {
            requests_per_window: r.get::<i64, _>("requests_per_window") as u32,
            window_secs: r.get::<i64, _>("window_secs") as u64,
        }))
    }

    pub async fn upsert(&self, provider_name: &str, limit: ProviderRateLimit) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO provider_config (provider_name, requests_per_window, window_secs) VALUES (?, ?, ?)
               ON CONFLICT(provider_name) DO UPDATE SET requests_per_window = excluded.requests_per_window, window_secs = excluded.window_secs"#,
        )
        .bind(provider_name)
        .bind(limit.requests_per_window as i64)
        .bind(limit.window_secs as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
