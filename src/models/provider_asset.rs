//! Provider asset catalog row — a candidate image/video fetched from an
//! external metadata provider, prior to being scored, selected, and cached.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::entity_ref::EntityRef;
use super::slot::Slot;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProviderAsset {
    pub id: Uuid,
    pub entity: EntityRef,
    pub slot: Slot,
    pub provider_name: String,
    pub provider_url: String,

    pub analyzed: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,

    pub content_hash: Option<String>,
    pub perceptual_hash: Option<u64>,

    pub score: i32,
    pub selected: bool,
    pub rejected: bool,
    pub downloaded: bool,

    pub discovered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate as returned by a `ProviderClient`, before it has been persisted
/// or scored (see `crate::identify`).
#[derive(Debug, Clone)]
pub struct CandidateAsset {
    pub slot: Slot,
    pub provider_name: String,
    pub provider_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub language: Option<String>,
    pub vote_average: Option<f64>,
    pub perceptual_hash: Option<u64>,
}
