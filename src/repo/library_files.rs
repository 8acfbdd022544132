//! Library-file repository: the published, ephemeral copies a `Publisher`
//! writes into the library layout. Rows here are what keeps a GC sweep from
//! reclaiming a cache file that's still backing something on disk.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::cache_file::LibraryFile;

pub struct LibraryFileRepository {
    pool: SqlitePool,
}

impl LibraryFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Upserts by `file_path`: republishing the same path replaces the prior
    /// row rather than accumulating duplicates.
    pub async fn create(&self, file: &LibraryFile) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO library_files (id, cache_file_id, file_path, published_at)
               VALUES (?,?,?,?)
               ON CONFLICT(file_path) DO UPDATE SET
                 cache_file_id = excluded.cache_file_id,
                 published_at = excluded.published_at"#,
        )
        .bind(uuid_to_text(file.id))
        .bind(uuid_to_text(file.cache_file_id))
        .bind(&file.file_path)
        .bind(datetime_to_text(file.published_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_cache_file(&self, cache_file_id: Uuid) -> Result<Vec<LibraryFile>> {
        let rows = sqlx::query("SELECT * FROM library_files WHERE cache_file_id = ?")
            .bind(uuid_to_text(cache_file_id))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM library_files WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<LibraryFile> {
    let id_text: String = row.try_get("id")?;
    let cache_file_id_text: String = row.try_get("cache_file_id")?;
    let published_at: String = row.try_get("published_at")?;

    Ok(LibraryFile {
        id: text_to_uuid(&id_text)?,
        cache_file_id: text_to_uuid(&cache_file_id_text)?,
        file_path: row.try_get("file_path")?,
        published_at: text_to_datetime(&published_at)?,
    })
}
