//! Media-player repository (): targets for `notify-kodi`.

use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::media_player::{MediaPlayer, PathMapping};

pub struct MediaPlayerRepository {
    pool: SqlitePool,
}

impl MediaPlayerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list_enabled(&self) -> Result<Vec<MediaPlayer>> {
        let rows = sqlx::query("SELECT * FROM media_players WHERE enabled = 1")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(from_row).collect()
    }

    pub async fn path_mappings_for(&self, player_id: Uuid) -> Result<Vec<PathMapping>> {
        let rows = sqlx::query("SELECT * FROM path_mappings WHERE player_id = ?")
            .bind(uuid_to_text(player_id))
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                Ok(PathMapping {
                    id: text_to_uuid(&row.try_get::<String, _>("id")?)?,
                    player_id: text_to_uuid(&row.try_get::<String, _>("player_id")?)?,
                    library_path_prefix: row.try_get("library_path_prefix")?,
                    player_path_prefix: row.try_get("player_path_prefix")?,
                })
            })
            .collect()
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<MediaPlayer> {
    let enabled: i64 = row.try_get("enabled")?;
    Ok(MediaPlayer {
        id: text_to_uuid(&row.try_get::<String, _>("id")?)?,
        group_id: text_to_uuid(&row.try_get::<String, _>("group_id")?)?,
        name: row.try_get("name")?,
        kind: row.try_get("kind")?,
        base_url: row.try_get("base_url")?,
        enabled: int_to_bool(enabled),
    })
}
