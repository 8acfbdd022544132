//! Movie entity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::locks::FieldLocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationStatus {
    Unidentified,
    Identified,
    Enriched,
    Published,
}

impl IdentificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unidentified => "unidentified",
            Self::Identified => "identified",
            Self::Enriched => "enriched",
            Self::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "unidentified" => Self::Unidentified,
            "identified" => Self::Identified,
            "enriched" => Self::Enriched,
            "published" => Self::Published,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Movie {
    pub id: Uuid,
    pub library_id: Uuid,

    pub file_path: String,
    pub file_name: String,
    pub file_size: i64,
    pub file_hash: Option<String>,

    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,

    pub title: String,
    pub original_title: Option<String>,
    pub sort_title: Option<String>,

    pub tagline: Option<String>,
    pub plot: Option<String>,
    pub outline: Option<String>,

    pub runtime_minutes: Option<i32>,
    pub year: Option<i32>,
    pub release_date: Option<chrono::NaiveDate>,
    pub content_rating: Option<String>,
    pub provider_rating: Option<f64>,
    pub user_rating: Option<f64>,

    pub monitored: bool,
    pub identification_status: IdentificationStatus,
    pub enrichment_priority: i32,

    pub enriched_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub locks: FieldLocks,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// `deleted_at`, if set, lies strictly in the future at the moment of
    /// soft-delete; this checks whether it has since passed (eligible for hard delete).
    pub fn is_past_retention(&self, now: DateTime<Utc>) -> bool {
        matches!(self.deleted_at, Some(at) if at <= now)
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.deleted_at.map(|at| at > now).unwrap_or(true)
    }
}

/// A typed, all-optional patch applied to a movie row: updates are
/// represented as data, not as composed SQL strings.
#[derive(Debug, Clone, Default)]
pub struct MoviePatch {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub sort_title: Option<String>,
    pub tagline: Option<String>,
    pub plot: Option<String>,
    pub outline: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub year: Option<i32>,
    pub release_date: Option<chrono::NaiveDate>,
    pub content_rating: Option<String>,
    pub provider_rating: Option<f64>,
    pub user_rating: Option<f64>,
    pub monitored: Option<bool>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub identification_status: Option<IdentificationStatus>,
    pub published_at: Option<DateTime<Utc>>,
}

impl MoviePatch {
    /// Maps a patch field name to the lock-policy field it is gated by. Only
    /// fields with a corresponding slot name in `FieldLocks` are listed; the
    /// rest (status fields, timestamps) are never user-lockable.
    pub fn touched_lock_fields(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.title.is_some() || self.sort_title.is_some() {
            out.push("title");
        }
        if self.plot.is_some() || self.outline.is_some() {
            out.push("plot");
        }
        if self.tagline.is_some() {
            out.push("tagline");
        }
        if self.year.is_some() || self.release_date.is_some() {
            out.push("year");
        }
        out
    }
}
