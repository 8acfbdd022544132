//! Unknown file tracking. Resolves in favour of the log-only policy:
//! unknown files are recorded and surfaced, never moved to a separate
//! recycle-bin table.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entity_ref::EntityRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCategory {
    Video,
    Image,
    Archive,
    Text,
    Other,
}

impl UnknownCategory {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "mkv" | "mp4" | "avi" | "m4v" | "ts" | "mov" | "wmv" => Self::Video,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" => Self::Image,
            "zip" | "rar" | "7z" | "tar" | "gz" => Self::Archive,
            "nfo" | "srt" | "ass" | "ssa" | "vtt" | "sub" | "idx" | "txt" => Self::Text,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UnknownFile {
    pub id: Uuid,
    pub entity: EntityRef,
    pub file_path: String,
    pub name: String,
    pub size_bytes: i64,
    pub extension: String,
    pub category: UnknownCategory,
    pub discovered_at: DateTime<Utc>,
}
