//! Content-addressed cache file and ephemeral library file rows.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entity_ref::EntityRef;
use super::slot::Slot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Image,
    Video,
    Audio,
    Text,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::Image => "image",
            CacheKind::Video => "video",
            CacheKind::Audio => "audio",
            CacheKind::Text => "text",
        }
    }

    /// On-disk directory name under `{dataDir}/cache/{kind}/...`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            CacheKind::Image => "images",
            CacheKind::Video => "videos",
            CacheKind::Audio => "audio",
            CacheKind::Text => "text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    Provider,
    Local,
    User,
}

impl AssetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSource::Provider => "provider",
            AssetSource::Local => "local",
            AssetSource::User => "user",
        }
    }
}

/// Kind-specific fields, one variant per cache kind.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum CacheDetail {
    Image {
        width: u32,
        height: u32,
        format: String,
        perceptual_hash: Option<u64>,
    },
    Video {
        codec: String,
        duration_secs: f64,
        bitrate: Option<i64>,
        hdr: Option<String>,
    },
    Text {
        text_kind: TextKind,
        subtitle_language: Option<String>,
    },
    Audio {
        audio_kind: AudioKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    Nfo,
    Subtitle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioKind {
    Theme,
    Unknown,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheFile {
    pub id: Uuid,
    pub entity: EntityRef,
    pub kind: CacheKind,
    pub slot: Option<Slot>,
    pub file_path: String,
    pub file_name: String,
    pub size_bytes: i64,
    pub content_hash: String,
    pub detail: CacheDetail,

    pub source: AssetSource,
    pub source_url: Option<String>,
    pub provider_name: Option<String>,
    pub classification_score: i32,

    pub ref_count: i32,
    pub locked: bool,

    pub discovered_at: DateTime<Utc>,
    pub last_accessed_at: DateTime<Utc>,
}

/// Library (published, ephemeral) file row.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LibraryFile {
    pub id: Uuid,
    pub cache_file_id: Uuid,
    pub file_path: String,
    pub published_at: DateTime<Utc>,
}

/// Sharded on-disk cache path: `{root}/{kind}/{hash[0:2]}/{hash[2:4]}/{hash}.{ext}`.
pub fn shard_path(root: &std::path::Path, kind: CacheKind, hash: &str, ext: &str) -> std::path::PathBuf {
    root.join(kind.dir_name())
        .join(&hash[0..2])
        .join(&hash[2..4])
        .join(format!("{hash}.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_path_is_two_level() {
        let root = std::path::Path::new("/data/cache");
        let p = shard_path(root, CacheKind::Image, "abcdef0123", "jpg");
        assert_eq!(p, std::path::PathBuf::from("/data/cache/images/ab/cd/abcdef0123.jpg"));
    }
}
