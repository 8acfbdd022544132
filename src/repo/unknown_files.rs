//! Unknown-file repository: log-only, no recycle bin.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::entity_ref::EntityRef;
use crate::models::unknown_file::{UnknownCategory, UnknownFile};

pub struct UnknownFileRepository {
    pool: SqlitePool,
}

impl UnknownFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, file: &UnknownFile) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO unknown_files (id, entity_type, entity_id, file_path, name, size_bytes, extension, category, discovered_at)
               VALUES (?,?,?,?,?,?,?,?,?)
               ON CONFLICT(file_path) DO UPDATE SET size_bytes = excluded.size_bytes, category = excluded.category"#,
        )
        .bind(uuid_to_text(file.id))
        .bind(file.entity.entity_type())
        .bind(uuid_to_text(file.entity.entity_id()))
        .bind(&file.file_path)
        .bind(&file.name)
        .bind(file.size_bytes)
        .bind(&file.extension)
        .bind(category_str(file.category))
        .bind(datetime_to_text(file.discovered_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_entity(&self, entity: EntityRef) -> Result<Vec<UnknownFile>> {
        let rows = sqlx::query("SELECT * FROM unknown_files WHERE entity_type = ? AND entity_id = ? ORDER BY discovered_at DESC")
            .bind(entity.entity_type())
            .bind(uuid_to_text(entity.entity_id()))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn clear_for_entity(&self, entity: EntityRef) -> Result<()> {
        sqlx::query("DELETE FROM unknown_files WHERE entity_type = ? AND entity_id = ?")
            .bind(entity.entity_type())
            .bind(uuid_to_text(entity.entity_id()))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn category_str(c: UnknownCategory) -> &'static str {
    match c {
        UnknownCategory::Video => "video",
        UnknownCategory::Image => "image",
        UnknownCategory::Archive => "archive",
        UnknownCategory::Text => "text",
        UnknownCategory::Other => "other",
    }
}

fn category_from_str(s: &str) -> UnknownCategory {
    match s {
        "video" => UnknownCategory::Video,
        "image" => UnknownCategory::Image,
        "archive" => UnknownCategory::Archive,
        "text" => UnknownCategory::Text,
        _ => UnknownCategory::Other,
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<UnknownFile> {
    let id_text: String = row.try_get("id")?;
    let entity_type: String = row.try_get("entity_type")?;
    let entity_id_text: String = row.try_get("entity_id")?;
    let category_text: String = row.try_get("category")?;
    let discovered_at: String = row.try_get("discovered_at")?;

    let entity = EntityRef::from_parts(&entity_type, text_to_uuid(&entity_id_text)?)
        .ok_or_else(|| crate::error::CuratorError::validation(format!("unknown entity_type {entity_type}")))?;

    Ok(UnknownFile {
        id: text_to_uuid(&id_text)?,
        entity,
        file_path: row.try_get("file_path")?,
        name: row.try_get("name")?,
        size_bytes: row.try_get("size_bytes")?,
        extension: row.try_get("extension")?,
        category: category_from_str(&category_text),
        discovered_at: text_to_datetime(&discovered_at)?,
    })
}
