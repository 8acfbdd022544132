//! Cache-file repository: the four cache kinds share one table
//! (`cache_files`); `detail` carries the kind-specific fields as JSON,
//! so a new kind never needs a migration.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::cache_file::{AssetSource, CacheDetail, CacheFile, CacheKind};
use crate::models::entity_ref::EntityRef;
use crate::models::slot::Slot;

pub struct CacheFileRepository {
    pool: SqlitePool,
}

impl CacheFileRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, file: &CacheFile) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO cache_files
                (id, entity_type, entity_id, kind, slot, file_path, file_name, size_bytes,
                 content_hash, detail, source, source_url, provider_name, classification_score,
                 ref_count, locked, discovered_at, last_accessed_at)
               VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"#,
        )
        .bind(uuid_to_text(file.id))
        .bind(file.entity.entity_type())
        .bind(uuid_to_text(file.entity.entity_id()))
        .bind(file.kind.as_str())
        .bind(file.slot.map(|s| s.as_str()))
        .bind(&file.file_path)
        .bind(&file.file_name)
        .bind(file.size_bytes)
        .bind(&file.content_hash)
        .bind(serde_json::to_string(&file.detail).unwrap_or_default())
        .bind(file.source.as_str())
        .bind(&file.source_url)
        .bind(&file.provider_name)
        .bind(file.classification_score)
        .bind(file.ref_count)
        .bind(bool_to_int(file.locked))
        .bind(datetime_to_text(file.discovered_at))
        .bind(datetime_to_text(file.last_accessed_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<CacheFile>> {
        let row = sqlx::query("SELECT * FROM cache_files WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }

    pub async fn get_by_hash(&self, content_hash: &str) -> Result<Option<CacheFile>> {
        let row = sqlx::query("SELECT * FROM cache_files WHERE content_hash = ? LIMIT 1")
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }

    /// Dominant list query: ordered by classification score desc, then
    /// discovered-at desc, served by the composite index in a single scan.
    pub async fn list_for_entity(&self, entity: EntityRef, slot: Option<Slot>) -> Result<Vec<CacheFile>> {
        let rows = if let Some(slot) = slot {
            sqlx::query(
                "SELECT * FROM cache_files WHERE entity_type = ? AND entity_id = ? AND slot = ?
                 ORDER BY classification_score DESC, discovered_at DESC",
            )
            .bind(entity.entity_type())
            .bind(uuid_to_text(entity.entity_id()))
            .bind(slot.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT * FROM cache_files WHERE entity_type = ? AND entity_id = ?
                 ORDER BY slot, classification_score DESC, discovered_at DESC",
            )
            .bind(entity.entity_type())
            .bind(uuid_to_text(entity.entity_id()))
            .fetch_all(&self.pool)
            .await?
        };
        rows.into_iter().map(from_row).collect()
    }

    /// Perceptual-hash neighbourhood scan for image dedup. SQLite
    /// has no bit-popcount builtin, so candidates are fetched by kind and
    /// filtered in Rust against the Hamming-distance threshold.
    pub async fn find_perceptual_duplicates(&self, entity: EntityRef, slot: Slot, phash: u64, threshold: u32) -> Result<Vec<CacheFile>> {
        let candidates = self.list_for_entity(entity, Some(slot)).await?;
        Ok(candidates
            .into_iter()
            .filter(|c| match &c.detail {
                CacheDetail::Image { perceptual_hash: Some(h), .. } => {
                    crate::hash::is_perceptual_duplicate(*h, phash, threshold)
                }
                _ => false,
            })
            .collect())
    }

    pub async fn increment_ref_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE cache_files SET ref_count = ref_count + 1 WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn decrement_ref_count(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE cache_files SET ref_count = MAX(ref_count - 1, 0) WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_accessed(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE cache_files SET last_accessed_at = ? WHERE id = ?")
            .bind(datetime_to_text(chrono::Utc::now()))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Rows eligible for gc: ref-count = 0 and no `library_files` referrer.
    pub async fn list_gc_candidates(&self) -> Result<Vec<CacheFile>> {
        let rows = sqlx::query(
            r#"SELECT cf.* FROM cache_files cf
               LEFT JOIN library_files lf ON lf.cache_file_id = cf.id
               WHERE cf.ref_count = 0 AND lf.id IS NULL"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM cache_files WHERE id = ?")
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<CacheFile> {
    let id_text: String = row.try_get("id")?;
    let entity_type: String = row.try_get("entity_type")?;
    let entity_id_text: String = row.try_get("entity_id")?;
    let kind_text: String = row.try_get("kind")?;
    let slot_text: Option<String> = row.try_get("slot")?;
    let detail_text: String = row.try_get("detail")?;
    let source_text: String = row.try_get("source")?;
    let locked: i64 = row.try_get("locked")?;
    let discovered_at: String = row.try_get("discovered_at")?;
    let last_accessed_at: String = row.try_get("last_accessed_at")?;

    let entity = EntityRef::from_parts(&entity_type, text_to_uuid(&entity_id_text)?)
        .ok_or_else(|| crate::error::CuratorError::validation(format!("unknown entity_type {entity_type}")))?;

    let kind = match kind_text.as_str() {
        "image" => CacheKind::Image,
        "video" => CacheKind::Video,
        "audio" => CacheKind::Audio,
        "text" => CacheKind::Text,
        other => return Err(crate::error::CuratorError::validation(format!("unknown cache kind {other}"))),
    };

    let source = match source_text.as_str() {
        "provider" => AssetSource::Provider,
        "local" => AssetSource::Local,
        "user" => AssetSource::User,
        other => return Err(crate::error::CuratorError::validation(format!("unknown asset source {other}"))),
    };

    Ok(CacheFile {
        id: text_to_uuid(&id_text)?,
        entity,
        kind,
        slot: slot_text.and_then(|s| slot_from_str(&s)),
        file_path: row.try_get("file_path")?,
        file_name: row.try_get("file_name")?,
        size_bytes: row.try_get("size_bytes")?,
        content_hash: row.try_get("content_hash")?,
        detail: serde_json::from_str(&detail_text)
            .map_err(|e| crate::error::CuratorError::Unknown { source: e.into() })?,
        source,
        source_url: row.try_get("source_url")?,
        provider_name: row.try_get("provider_name")?,
        classification_score: row.try_get("classification_score")?,
        ref_count: row.try_get("ref_count")?,
        locked: int_to_bool(locked),
        discovered_at: text_to_datetime(&discovered_at)?,
        last_accessed_at: text_to_datetime(&last_accessed_at)?,
    })
}

fn slot_from_str(s: &str) -> Option<Slot> {
    Slot::IMAGE_SLOTS
        .iter()
        .copied()
        .chain([Slot::Trailer, Slot::Subtitle, Slot::Theme])
        .find(|slot| slot.as_str() == s)
}
