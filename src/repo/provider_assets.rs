//! Provider-asset repository: candidate images/videos discovered during
//! enrichment, scored and persisted ahead of selection so a re-run of
//! `enrich` doesn't refetch assets it has already seen for this entity/slot.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::entity_ref::EntityRef;
use crate::models::provider_asset::ProviderAsset;
use crate::models::slot::Slot;

pub struct ProviderAssetRepository {
    pool: SqlitePool,
}

impl ProviderAssetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a candidate, or refreshes its score/dimensions in place if the
    /// same (entity, slot, provider_url) was already discovered — the unique
    /// index makes this a dedup key, not just a constraint.
    pub async fn upsert(&self, asset: &ProviderAsset) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO provider_assets
                (id, entity_type, entity_id, slot, provider_name, provider_url,
                 analyzed, width, height, duration_secs, content_hash, perceptual_hash,
                 score, selected, rejected, downloaded, discovered_at, updated_at)
               VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
               ON CONFLICT(entity_type, entity_id, slot, provider_url) DO UPDATE SET
                 analyzed = excluded.analyzed,
                 width = excluded.width,
                 height = excluded.height,
                 duration_secs = excluded.duration_secs,
                 content_hash = excluded.content_hash,
                 perceptual_hash = excluded.perceptual_hash,
                 score = excluded.score,
                 selected = excluded.selected,
                 rejected = excluded.rejected,
                 downloaded = excluded.downloaded,
                 updated_at = excluded.updated_at"#,
        )
        .bind(uuid_to_text(asset.id))
        .bind(asset.entity.entity_type())
        .bind(uuid_to_text(asset.entity.entity_id()))
        .bind(asset.slot.as_str())
        .bind(&asset.provider_name)
        .bind(&asset.provider_url)
        .bind(bool_to_int(asset.analyzed))
        .bind(asset.width)
        .bind(asset.height)
        .bind(asset.duration_secs)
        .bind(&asset.content_hash)
        .bind(asset.perceptual_hash.map(|h| h as i64))
        .bind(asset.score)
        .bind(bool_to_int(asset.selected))
        .bind(bool_to_int(asset.rejected))
        .bind(bool_to_int(asset.downloaded))
        .bind(datetime_to_text(asset.discovered_at))
        .bind(datetime_to_text(asset.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn list_for_slot(&self, entity: EntityRef, slot: Slot) -> Result<Vec<ProviderAsset>> {
        let rows = sqlx::query(
            "SELECT * FROM provider_assets WHERE entity_type = ? AND entity_id = ? AND slot = ?
             ORDER BY score DESC, discovered_at DESC",
        )
        .bind(entity.entity_type())
        .bind(uuid_to_text(entity.entity_id()))
        .bind(slot.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn mark_selected(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE provider_assets SET selected = 1, updated_at = ? WHERE id = ?")
            .bind(datetime_to_text(chrono::Utc::now()))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn mark_downloaded(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE provider_assets SET downloaded = 1, updated_at = ? WHERE id = ?")
            .bind(datetime_to_text(chrono::Utc::now()))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<ProviderAsset> {
    let id_text: String = row.try_get("id")?;
    let entity_type: String = row.try_get("entity_type")?;
    let entity_id_text: String = row.try_get("entity_id")?;
    let slot_text: String = row.try_get("slot")?;
    let selected: i64 = row.try_get("selected")?;
    let rejected: i64 = row.try_get("rejected")?;
    let downloaded: i64 = row.try_get("downloaded")?;
    let analyzed: i64 = row.try_get("analyzed")?;
    let discovered_at: String = row.try_get("discovered_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let perceptual_hash: Option<i64> = row.try_get("perceptual_hash")?;

    let entity = EntityRef::from_parts(&entity_type, text_to_uuid(&entity_id_text)?)
        .ok_or_else(|| crate::error::CuratorError::validation(format!("unknown entity_type {entity_type}")))?;

    let slot = slot_from_str(&slot_text)
        .ok_or_else(|| crate::error::CuratorError::validation(format!("unknown slot {slot_text}")))?;

    Ok(ProviderAsset {
        id: text_to_uuid(&id_text)?,
        entity,
        slot,
        provider_name: row.try_get("provider_name")?,
        provider_url: row.try_get("provider_url")?,
        analyzed: int_to_bool(analyzed),
        width: row.try_get("width")?,
        height: row.try_get("height")?,
        duration_secs: row.try_get("duration_secs")?,
        content_hash: row.try_get("content_hash")?,
        perceptual_hash: perceptual_hash.map(|h| h as u64),
        score: row.try_get("score")?,
        selected: int_to_bool(selected),
        rejected: int_to_bool(rejected),
        downloaded: int_to_bool(downloaded),
        discovered_at: text_to_datetime(&discovered_at)?,
        updated_at: text_to_datetime(&updated_at)?,
    })
}

fn slot_from_str(s: &str) -> Option<Slot> {
    Slot::IMAGE_SLOTS
        .iter()
        .copied()
        .chain([Slot::Trailer, Slot::Subtitle, Slot::Theme])
        .find(|slot| slot.as_str() == s)
}
