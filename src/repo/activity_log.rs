//! Activity log repository (): a durable, human-readable
//! audit trail of what the worker did, independent of the transient
//! WebSocket event stream.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::entity_ref::EntityRef;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    pub entity: Option<EntityRef>,
    pub action: String,
    pub message: String,
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

pub struct ActivityLogRepository {
    pool: SqlitePool,
}

impl ActivityLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, entity: Option<EntityRef>, action: &str, message: &str, detail: Option<serde_json::Value>) -> Result<()> {
        sqlx::query(
            "INSERT INTO activity_log (id, entity_type, entity_id, action, message, detail, created_at) VALUES (?,?,?,?,?,?,?)",
        )
        .bind(uuid_to_text(Uuid::new_v4()))
        .bind(entity.map(|e| e.entity_type()))
        .bind(entity.map(|e| uuid_to_text(e.entity_id())))
        .bind(action)
        .bind(message)
        .bind(detail.map(|d| d.to_string()))
        .bind(datetime_to_text(Utc::now()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn recent_for_entity(&self, entity: EntityRef, limit: i64) -> Result<Vec<ActivityLogEntry>> {
        let rows = sqlx::query(
            "SELECT * FROM activity_log WHERE entity_type = ? AND entity_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(entity.entity_type())
        .bind(uuid_to_text(entity.entity_id()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(from_row).collect()
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<ActivityLogEntry> {
    let id_text: String = row.try_get("id")?;
    let entity_type: Option<String> = row.try_get("entity_type")?;
    let entity_id_text: Option<String> = row.try_get("entity_id")?;
    let detail_text: Option<String> = row.try_get("detail")?;
    let created_at: String = row.try_get("created_at")?;

    let entity = match (entity_type, entity_id_text) {
        (Some(t), Some(id)) => EntityRef::from_parts(&t, text_to_uuid(&id)?),
        _ => None,
    };

    Ok(ActivityLogEntry {
        id: text_to_uuid(&id_text)?,
        entity,
        action: row.try_get("action")?,
        message: row.try_get("message")?,
        detail: detail_text.and_then(|d| serde_json::from_str(&d).ok()),
        created_at: text_to_datetime(&created_at)?,
    })
}
