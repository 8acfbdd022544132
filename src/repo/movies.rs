//! Movie repository.

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::sqlite_helpers::*;
use crate::error::Result;
use crate::models::{IdentificationStatus, Movie, MoviePatch};

pub struct MovieRepository {
    pool: SqlitePool,
}

impl MovieRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, movie: &Movie) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO movies
                (id, library_id, file_path, file_name, file_size, file_hash, tmdb_id, imdb_id,
                 title, original_title, sort_title, tagline, plot, outline,
                 runtime_minutes, year, release_date, content_rating, provider_rating, user_rating,
                 monitored, identification_status, enrichment_priority, locked_fields,
                 enriched_at, published_at, deleted_at, created_at, updated_at)
               VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"#,
        )
        .bind(uuid_to_text(movie.id))
        .bind(uuid_to_text(movie.library_id))
        .bind(&movie.file_path)
        .bind(&movie.file_name)
        .bind(movie.file_size)
        .bind(&movie.file_hash)
        .bind(movie.tmdb_id)
        .bind(&movie.imdb_id)
        .bind(&movie.title)
        .bind(&movie.original_title)
        .bind(&movie.sort_title)
        .bind(&movie.tagline)
        .bind(&movie.plot)
        .bind(&movie.outline)
        .bind(movie.runtime_minutes)
        .bind(movie.year)
        .bind(movie.release_date.map(|d| d.to_string()))
        .bind(&movie.content_rating)
        .bind(movie.provider_rating)
        .bind(movie.user_rating)
        .bind(bool_to_int(movie.monitored))
        .bind(movie.identification_status.as_str())
        .bind(movie.enrichment_priority)
        .bind(locks_to_json(&movie.locks))
        .bind(opt_datetime_to_text(movie.enriched_at))
        .bind(opt_datetime_to_text(movie.published_at))
        .bind(opt_datetime_to_text(movie.deleted_at))
        .bind(datetime_to_text(movie.created_at))
        .bind(datetime_to_text(movie.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Movie>> {
        let row = sqlx::query("SELECT * FROM movies WHERE id = ?")
            .bind(uuid_to_text(id))
            .fetch_optional(&self.pool)
            .await?;
        row.map(from_row).transpose()
    }

    /// Visible (non soft-deleted, or still within the grace window) movies.
    pub async fn list_visible(&self, library_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Movie>> {
        let rows = sqlx::query(
            "SELECT * FROM movies WHERE library_id = ? AND (deleted_at IS NULL OR deleted_at > ?) ORDER BY sort_title, title",
        )
        .bind(uuid_to_text(library_id))
        .bind(datetime_to_text(now))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(from_row).collect()
    }

    /// Applies a typed patch, honouring `FieldLocks` for every touched
    /// lockable field unless `force` is set.
    pub async fn apply_patch(&self, id: Uuid, patch: &MoviePatch, user_initiated: bool, force: bool) -> Result<()> {
        use crate::models::locks::{LockPolicy, StandardLockPolicy};

        let Some(mut movie) = self.get(id).await? else {
            return Err(crate::error::CuratorError::not_found("movie", id.to_string()));
        };

        let policy = StandardLockPolicy;
        for field in patch.touched_lock_fields() {
            policy.check(&movie.locks, field, force)?;
            if user_initiated {
                movie.locks.lock(field);
            }
        }

        if let Some(v) = &patch.title {
            movie.title = v.clone();
        }
        if let Some(v) = &patch.original_title {
            movie.original_title = Some(v.clone());
        }
        if let Some(v) = &patch.sort_title {
            movie.sort_title = Some(v.clone());
        }
        if let Some(v) = &patch.tagline {
            movie.tagline = Some(v.clone());
        }
        if let Some(v) = &patch.plot {
            movie.plot = Some(v.clone());
        }
        if let Some(v) = &patch.outline {
            movie.outline = Some(v.clone());
        }
        if let Some(v) = patch.runtime_minutes {
            movie.runtime_minutes = Some(v);
        }
        if let Some(v) = patch.year {
            movie.year = Some(v);
        }
        if let Some(v) = patch.release_date {
            movie.release_date = Some(v);
        }
        if let Some(v) = &patch.content_rating {
            movie.content_rating = Some(v.clone());
        }
        if let Some(v) = patch.provider_rating {
            movie.provider_rating = Some(v);
        }
        if let Some(v) = patch.user_rating {
            movie.user_rating = Some(v);
        }
        if let Some(v) = patch.monitored {
            movie.monitored = v;
        }
        if let Some(v) = patch.tmdb_id {
            movie.tmdb_id = Some(v);
        }
        if let Some(v) = &patch.imdb_id {
            movie.imdb_id = Some(v.clone());
        }
        if let Some(v) = patch.identification_status {
            movie.identification_status = v;
        }
        if let Some(v) = patch.published_at {
            movie.published_at = Some(v);
        }
        movie.updated_at = Utc::now();

        sqlx::query(
            r#"UPDATE movies SET title=?, original_title=?, sort_title=?, tagline=?, plot=?, outline=?,
               runtime_minutes=?, year=?, release_date=?, content_rating=?, provider_rating=?, user_rating=?,
               monitored=?, tmdb_id=?, imdb_id=?, identification_status=?, locked_fields=?, published_at=?, updated_at=?
               WHERE id=?"#,
        )
        .bind(&movie.title)
        .bind(&movie.original_title)
        .bind(&movie.sort_title)
        .bind(&movie.tagline)
        .bind(&movie.plot)
        .bind(&movie.outline)
        .bind(movie.runtime_minutes)
        .bind(movie.year)
        .bind(movie.release_date.map(|d| d.to_string()))
        .bind(&movie.content_rating)
        .bind(movie.provider_rating)
        .bind(movie.user_rating)
        .bind(bool_to_int(movie.monitored))
        .bind(movie.tmdb_id)
        .bind(&movie.imdb_id)
        .bind(movie.identification_status.as_str())
        .bind(locks_to_json(&movie.locks))
        .bind(opt_datetime_to_text(movie.published_at))
        .bind(datetime_to_text(movie.updated_at))
        .bind(uuid_to_text(id))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft-delete: `deleted_at = now + retention_days`.
    pub async fn soft_delete(&self, id: Uuid, retention_days: i64) -> Result<()> {
        let deleted_at = Utc::now() + chrono::Duration::days(retention_days);
        sqlx::query("UPDATE movies SET deleted_at = ?, updated_at = ? WHERE id = ?")
            .bind(datetime_to_text(deleted_at))
            .bind(datetime_to_text(Utc::now()))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE movies SET deleted_at = NULL, updated_at = ? WHERE id = ?")
            .bind(datetime_to_text(Utc::now()))
            .bind(uuid_to_text(id))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// `cleanup` job: hard-deletes movies whose retention window has passed;
    /// the DB trigger cascades to cache/library rows.
    pub async fn hard_delete_past_retention(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT id FROM movies WHERE deleted_at IS NOT NULL AND deleted_at <= ?")
            .bind(datetime_to_text(now))
            .fetch_all(&self.pool)
            .await?;
        let mut deleted = Vec::new();
        for row in rows {
            let id_text: String = row.try_get("id")?;
            let id = text_to_uuid(&id_text)?;
            sqlx::query("DELETE FROM movies WHERE id = ?")
                .bind(&id_text)
                .execute(&self.pool)
                .await?;
            deleted.push(id);
        }
        Ok(deleted)
    }
}

fn from_row(row: sqlx::sqlite::SqliteRow) -> Result<Movie> {
    let id_text: String = row.try_get("id")?;
    let library_id_text: String = row.try_get("library_id")?;
    let monitored: i64 = row.try_get("monitored")?;
    let status_text: String = row.try_get("identification_status")?;
    let locked_fields: String = row.try_get("locked_fields")?;
    let release_date: Option<String> = row.try_get("release_date")?;
    let enriched_at: Option<String> = row.try_get("enriched_at")?;
    let published_at: Option<String> = row.try_get("published_at")?;
    let deleted_at: Option<String> = row.try_get("deleted_at")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Movie {
        id: text_to_uuid(&id_text)?,
        library_id: text_to_uuid(&library_id_text)?,
        file_path: row.try_get("file_path")?,
        file_name: row.try_get("file_name")?,
        file_size: row.try_get("file_size")?,
        file_hash: row.try_get("file_hash")?,
        tmdb_id: row.try_get("tmdb_id")?,
        imdb_id: row.try_get("imdb_id")?,
        title: row.try_get("title")?,
        original_title: row.try_get("original_title")?,
        sort_title: row.try_get("sort_title")?,
        tagline: row.try_get("tagline")?,
        plot: row.try_get("plot")?,
        outline: row.try_get("outline")?,
        runtime_minutes: row.try_get("runtime_minutes")?,
        year: row.try_get("year")?,
        release_date: release_date.and_then(|d| d.parse().ok()),
        content_rating: row.try_get("content_rating")?,
        provider_rating: row.try_get("provider_rating")?,
        user_rating: row.try_get("user_rating")?,
        monitored: int_to_bool(monitored),
        identification_status: IdentificationStatus::from_str(&status_text)
            .unwrap_or(IdentificationStatus::Unidentified),
        enrichment_priority: row.try_get("enrichment_priority")?,
        enriched_at: opt_text_to_datetime(enriched_at)?,
        published_at: opt_text_to_datetime(published_at)?,
        deleted_at: opt_text_to_datetime(deleted_at)?,
        locks: locks_from_json(&locked_fields),
        created_at: text_to_datetime(&created_at)?,
        updated_at: text_to_datetime(&updated_at)?,
    })
}
