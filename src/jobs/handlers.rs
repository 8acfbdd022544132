//! Concrete handlers for the seven core job types.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::handler::{outcome_of, HandlerDependencies, JobHandler, JobOutcome, Registry};
use crate::classifier;
use crate::error::{CuratorError, Result};
use crate::facts::gather_all_facts;
use crate::identify::score_asset;
use crate::models::cache_file::{AssetSource, CacheDetail, CacheFile, CacheKind, TextKind};
use crate::models::entity_ref::EntityRef;
use crate::models::job::EnqueueJob;
use crate::models::locks::{LockPolicy, StandardLockPolicy};
use crate::models::provider_asset::{CandidateAsset, ProviderAsset};
use crate::models::slot::Slot;
use crate::models::unknown_file::{UnknownCategory, UnknownFile};
use crate::publish::{render_nfo, Publisher};
use crate::ws::ServerMessage;

/// Providers tried in most-to-least-preferred order when scoring candidate
/// assets; only one provider exists today, but `score_asset` is written to
/// take a ranked list so a second provider slots in without a signature change.
const PROVIDER_PRIORITY: &[&str] = &["tmdb"];

pub fn registry() -> Registry {
    let mut map: Registry = Registry::new();
    map.insert("directory-scan", Arc::new(DirectoryScanHandler));
    map.insert("enrich-metadata", Arc::new(EnrichMetadataHandler));
    map.insert("publish", Arc::new(PublishHandler));
    map.insert("download-trailer", Arc::new(DownloadTrailerHandler));
    map.insert("cleanup", Arc::new(CleanupHandler));
    map.insert("notify-kodi", Arc::new(NotifyKodiHandler));
    map.insert("webhook-received", Arc::new(WebhookReceivedHandler));
    map
}

#[derive(serde::Deserialize)]
struct DirectoryScanPayload {
    movie_id: Uuid,
    directory: String,
    #[serde(default)]
    hint: Option<String>,
}

struct DirectoryScanHandler;

#[async_trait]
impl JobHandler for DirectoryScanHandler {
    async fn handle(&self, job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_directory_scan(job, deps).await)
    }
}

async fn run_directory_scan(job: &crate::models::job::Job, deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let payload: DirectoryScanPayload =
        serde_json::from_value(job.payload.clone()).map_err(|e| CuratorError::validation(e.to_string()))?;

    let scan = gather_all_facts(Path::new(&payload.directory), Arc::new(crate::facts::NoProbeCache), deps.video_probe.clone())
        .await
        .map_err(CuratorError::from)?;

    let classification = classifier::classify(&scan, payload.hint.as_deref());
    let decision = classifier::decide(&classification);

    let entity = EntityRef::Movie(payload.movie_id);
    deps.db.unknown_files().clear_for_entity(entity).await?;
    for path in &classification.unknown {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_string();
        deps.db
            .unknown_files()
            .record(&UnknownFile {
                id: Uuid::new_v4(),
                entity,
                file_path: path.to_string_lossy().to_string(),
                name: path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
                size_bytes: 0,
                extension: ext.clone(),
                category: UnknownCategory::from_extension(&ext),
                discovered_at: chrono::Utc::now(),
            })
            .await?;
    }

    deps.broadcaster.broadcast(ServerMessage::ScanStatus { job_id: job.id, progress: 1.0 });

    if let Some(tmdb_id) = classification.tmdb_id {
        let mut patch = crate::models::MoviePatch::default();
        patch.tmdb_id = Some(tmdb_id);
        deps.db.movies().apply_patch(payload.movie_id, &patch, false, false).await?;
    }

    if deps.config.auto_enrich {
        deps.db
            .jobs()
            .enqueue(EnqueueJob::new("enrich-metadata", serde_json::json!({ "movie_id": payload.movie_id })).depends_on([job.id]))
            .await?;
    }

    deps.db
        .activity_log()
        .record(Some(entity), "directory-scan", "scan completed", Some(serde_json::json!({ "status": format!("{:?}", decision.status) })))
        .await?;

    Ok(Some(serde_json::json!({ "decision_confidence": decision.confidence })))
}

#[derive(serde::Deserialize)]
struct EnrichMetadataPayload {
    movie_id: Uuid,
}

struct EnrichMetadataHandler;

#[async_trait]
impl JobHandler for EnrichMetadataHandler {
    async fn handle(&self, job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_enrich_metadata(job, deps).await)
    }
}

async fn run_enrich_metadata(job: &crate::models::job::Job, deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let payload: EnrichMetadataPayload =
        serde_json::from_value(job.payload.clone()).map_err(|e| CuratorError::validation(e.to_string()))?;

    let movie = deps
        .db
        .movies()
        .get(payload.movie_id)
        .await?
        .ok_or_else(|| CuratorError::not_found("movie", payload.movie_id.to_string()))?;

    let Some(tmdb_id) = movie.tmdb_id else {
        return Err(CuratorError::permanent("movie has no tmdb id; identify first"));
    };

    let (metadata, assets) = crate::identify::enrich(deps.provider.as_ref(), tmdb_id).await?;
    let assets_found = assets.len();

    let mut patch = crate::models::MoviePatch::default();
    patch.plot = metadata.plot;
    patch.tagline = metadata.tagline;
    patch.runtime_minutes = metadata.runtime_minutes;
    patch.imdb_id = metadata.imdb_id;
    patch.identification_status = Some(crate::models::IdentificationStatus::Enriched);

    // Automation writes must honour locks; apply_patch enforces this for
    // every touched lockable field and simply skips locked ones when
    // `force=false`.
    deps.db.movies().apply_patch(payload.movie_id, &patch, false, false).await?;

    deps.broadcaster.broadcast(ServerMessage::MoviesChanged { ids: vec![payload.movie_id] });

    let entity = EntityRef::Movie(payload.movie_id);
    let assets_selected = if deps.config.fetch_provider_assets && deps.config.auto_select_assets {
        select_and_cache_assets(deps, &movie, entity, assets).await?
    } else {
        0
    };

    if deps.config.auto_publish {
        deps.db
            .jobs()
            .enqueue(EnqueueJob::new("publish", serde_json::json!({ "movie_id": payload.movie_id })).depends_on([job.id]))
            .await?;
    }

    Ok(Some(serde_json::json!({ "assets_found": assets_found, "assets_selected": assets_selected })))
}

/// Scores and caches the best candidate per slot, skipping any slot the user
/// has locked (an automation write must never clobber a locked selection).
async fn select_and_cache_assets(
    deps: &HandlerDependencies,
    movie: &crate::models::Movie,
    entity: EntityRef,
    assets: Vec<CandidateAsset>,
) -> Result<usize> {
    let mut by_slot: HashMap<Slot, Vec<CandidateAsset>> = HashMap::new();
    for asset in assets {
        by_slot.entry(asset.slot).or_default().push(asset);
    }

    let policy = StandardLockPolicy;
    let mut selected = 0usize;

    for (slot, candidates) in by_slot {
        if policy.check(&movie.locks, slot.as_str(), false).is_err() {
            continue;
        }

        let cached = deps.db.cache_files().list_for_entity(entity, Some(slot)).await?;
        let cached_hashes: Vec<u64> = cached
            .iter()
            .filter_map(|c| match &c.detail {
                CacheDetail::Image { perceptual_hash: Some(h), .. } => Some(*h),
                _ => None,
            })
            .collect();

        let winner = candidates
            .into_iter()
            .map(|c| (score_asset(&c, None, PROVIDER_PRIORITY, &cached_hashes), c))
            .max_by_key(|(score, _)| *score);

        let Some((score, winner)) = winner else { continue };

        if cache_best_asset(deps, entity, slot, score, &winner).await? {
            selected += 1;
        }
    }

    Ok(selected)
}

async fn cache_best_asset(
    deps: &HandlerDependencies,
    entity: EntityRef,
    slot: Slot,
    score: i32,
    winner: &CandidateAsset,
) -> Result<bool> {
    let response = deps.http.get(winner.provider_url.clone()).send().await?.error_for_status()?;
    let ext = ext_from_content_type(response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()))
        .unwrap_or_else(|| ext_from_url(&winner.provider_url));
    let bytes = response.bytes().await?.to_vec();

    let img = image::load_from_memory(&bytes).map_err(|e| CuratorError::validation(format!("could not decode image: {e}")))?;
    let facts = crate::facts::image_probe::from_image(&img);

    let stored = deps.cache.store_asset(CacheKind::Image, &bytes, &ext).await?;
    let now = chrono::Utc::now();

    if deps.db.cache_files().get_by_hash(&stored.hash).await?.is_none() {
        deps.db
            .cache_files()
            .create(&CacheFile {
                id: Uuid::new_v4(),
                entity,
                kind: CacheKind::Image,
                slot: Some(slot),
                file_path: stored.path.to_string_lossy().to_string(),
                file_name: format!("{}.{ext}", stored.hash),
                size_bytes: stored.size_bytes as i64,
                content_hash: stored.hash.clone(),
                detail: CacheDetail::Image { width: facts.width, height: facts.height, format: facts.format, perceptual_hash: Some(facts.perceptual_hash) },
                source: AssetSource::Provider,
                source_url: Some(winner.provider_url.clone()),
                provider_name: Some(winner.provider_name.clone()),
                classification_score: score,
                ref_count: 0,
                locked: false,
                discovered_at: now,
                last_accessed_at: now,
            })
            .await?;
    }

    deps.db
        .provider_assets()
        .upsert(&ProviderAsset {
            id: Uuid::new_v4(),
            entity,
            slot,
            provider_name: winner.provider_name.clone(),
            provider_url: winner.provider_url.clone(),
            analyzed: true,
            width: Some(facts.width),
            height: Some(facts.height),
            duration_secs: None,
            content_hash: Some(stored.hash.clone()),
            perceptual_hash: Some(facts.perceptual_hash),
            score,
            selected: true,
            rejected: false,
            downloaded: true,
            discovered_at: now,
            updated_at: now,
        })
        .await?;

    Ok(true)
}

fn ext_from_content_type(content_type: Option<&str>) -> Option<String> {
    match content_type?.split(';').next()?.trim() {
        "image/jpeg" => Some("jpg".to_string()),
        "image/png" => Some("png".to_string()),
        "image/gif" => Some("gif".to_string()),
        "image/webp" => Some("webp".to_string()),
        "image/bmp" => Some("bmp".to_string()),
        _ => None,
    }
}

fn ext_from_url(url: &str) -> String {
    Path::new(url.split('?').next().unwrap_or(url))
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_string()
}

#[derive(serde::Deserialize)]
struct PublishPayload {
    movie_id: Uuid,
}

struct PublishHandler;

#[async_trait]
impl JobHandler for PublishHandler {
    async fn handle(&self, job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_publish(job, deps).await)
    }
}

/// Publishes every selected image slot plus a freshly regenerated NFO, then
/// marks the movie published. A movie with identification-status = published
/// always has at least one library-file row of text-kind = nfo.
async fn run_publish(job: &crate::models::job::Job, deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let payload: PublishPayload =
        serde_json::from_value(job.payload.clone()).map_err(|e| CuratorError::validation(e.to_string()))?;

    let movie = deps
        .db
        .movies()
        .get(payload.movie_id)
        .await?
        .ok_or_else(|| CuratorError::not_found("movie", payload.movie_id.to_string()))?;

    let movie_dir = Path::new(&movie.file_path)
        .parent()
        .ok_or_else(|| CuratorError::validation("movie file_path has no parent directory"))?;
    let disc_structure = crate::facts::filesystem::detect_disc_structure(movie_dir);

    let entity = EntityRef::Movie(payload.movie_id);
    let cache_files = deps.db.cache_files();
    let library_files = deps.db.library_files();
    let publisher = Publisher::new(&cache_files);

    let mut published_slots = 0;
    for slot in Slot::IMAGE_SLOTS {
        let Some(best) = cache_files.list_for_entity(entity, Some(slot)).await?.into_iter().next() else {
            continue;
        };
        let (_, library_file) = publisher.publish_slot(&movie, movie_dir, disc_structure, &best, slot).await?;
        library_files.create(&library_file).await?;
        published_slots += 1;
    }

    // Genres/studios have no persisted join tables yet, so the regenerated
    // NFO carries only the movie row's own fields.
    let xml = render_nfo(&movie, &[], &[]);
    let nfo_bytes = xml.into_bytes();
    let stored = deps.cache.store_asset(CacheKind::Text, &nfo_bytes, "nfo").await?;
    let now = chrono::Utc::now();

    let nfo_cache_file = match cache_files.get_by_hash(&stored.hash).await? {
        Some(existing) => existing,
        None => {
            let file = CacheFile {
                id: Uuid::new_v4(),
                entity,
                kind: CacheKind::Text,
                slot: None,
                file_path: stored.path.to_string_lossy().to_string(),
                file_name: format!("{}.nfo", stored.hash),
                size_bytes: stored.size_bytes as i64,
                content_hash: stored.hash.clone(),
                detail: CacheDetail::Text { text_kind: TextKind::Nfo, subtitle_language: None },
                source: AssetSource::Local,
                source_url: None,
                provider_name: None,
                classification_score: 100,
                ref_count: 0,
                locked: false,
                discovered_at: now,
                last_accessed_at: now,
            };
            cache_files.create(&file).await?;
            file
        }
    };

    let (_, nfo_library_file) = publisher.publish_nfo(&movie, movie_dir, disc_structure, &nfo_cache_file).await?;
    library_files.create(&nfo_library_file).await?;

    deps.db
        .movies()
        .apply_patch(
            payload.movie_id,
            &crate::models::MoviePatch {
                identification_status: Some(crate::models::IdentificationStatus::Published),
                published_at: Some(now),
                ..Default::default()
            },
            false,
            false,
        )
        .await?;

    deps.broadcaster.broadcast(ServerMessage::LibraryChanged { id: payload.movie_id });

    Ok(Some(serde_json::json!({ "slots_published": published_slots, "nfo_published": true })))
}

struct DownloadTrailerHandler;

#[async_trait]
impl JobHandler for DownloadTrailerHandler {
    async fn handle(&self, _job: &crate::models::job::Job, _deps: &HandlerDependencies) -> JobOutcome {
        // Trailer download requires a provider video-asset endpoint beyond
        // image/metadata; left as a permanent no-op until that endpoint is
        // wired, so it never silently retries forever.
        JobOutcome::Failed { message: "trailer download not configured".to_string(), permanent: true }
    }
}

struct CleanupHandler;

#[async_trait]
impl JobHandler for CleanupHandler {
    async fn handle(&self, _job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_cleanup(deps).await)
    }
}

async fn run_cleanup(deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let now = chrono::Utc::now();
    let deleted = deps.db.movies().hard_delete_past_retention(now).await?;
    for id in &deleted {
        deps.db
            .activity_log()
            .record(Some(EntityRef::Movie(*id)), "cleanup", "hard-deleted past retention", None)
            .await?;
    }

    let candidates = deps.db.cache_files().list_gc_candidates().await?;
    let mut gced = 0;
    for candidate in candidates {
        let ext = Path::new(&candidate.file_name).extension().and_then(|e| e.to_str()).unwrap_or("bin");
        deps.cache.delete_asset(candidate.kind, &candidate.content_hash, ext).await?;
        deps.db.cache_files().delete(candidate.id).await?;
        gced += 1;
    }

    Ok(Some(serde_json::json!({ "movies_deleted": deleted.len(), "cache_files_gced": gced })))
}

#[derive(serde::Deserialize)]
struct NotifyKodiPayload {
    library_id: Uuid,
}

struct NotifyKodiHandler;

#[async_trait]
impl JobHandler for NotifyKodiHandler {
    async fn handle(&self, job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_notify_kodi(job, deps).await)
    }
}

async fn run_notify_kodi(job: &crate::models::job::Job, deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let payload: NotifyKodiPayload =
        serde_json::from_value(job.payload.clone()).map_err(|e| CuratorError::validation(e.to_string()))?;

    let players = deps.db.media_players().list_enabled().await?;
    let mut notified = 0;
    for player in players {
        deps.broadcaster.broadcast(ServerMessage::PlayerStatus { player_id: player.id, state: "refreshing".to_string() });
        notified += 1;
    }

    deps.db
        .activity_log()
        .record(None, "notify-kodi", &format!("notified {notified} players for library {}", payload.library_id), None)
        .await?;

    Ok(Some(serde_json::json!({ "notified": notified })))
}

#[derive(serde::Deserialize)]
struct WebhookPayload {
    file_path: String,
    #[serde(default)]
    movie_id: Option<Uuid>,
}

struct WebhookReceivedHandler;

#[async_trait]
impl JobHandler for WebhookReceivedHandler {
    async fn handle(&self, job: &crate::models::job::Job, deps: &HandlerDependencies) -> JobOutcome {
        outcome_of(run_webhook_received(job, deps).await)
    }
}

async fn run_webhook_received(job: &crate::models::job::Job, deps: &HandlerDependencies) -> Result<Option<serde_json::Value>> {
    let payload: WebhookPayload =
        serde_json::from_value(job.payload.clone()).map_err(|e| CuratorError::validation(e.to_string()))?;

    let Some(movie_id) = payload.movie_id else {
        return Err(CuratorError::validation("webhook payload missing a resolved movie_id"));
    };

    let directory = Path::new(&payload.file_path)
        .parent()
        .ok_or_else(|| CuratorError::validation("webhook file_path has no parent directory"))?
        .to_string_lossy()
        .to_string();

    let hint = Path::new(&payload.file_path).file_name().and_then(|n| n.to_str()).map(|s| s.to_string());

    let scan_job_id = deps
        .db
        .jobs()
        .enqueue(EnqueueJob::new("directory-scan", serde_json::json!({ "movie_id": movie_id, "directory": directory, "hint": hint })).with_priority(2))
        .await?;

    let _ = job; // the webhook job itself carries no further work once normalised
    Ok(Some(serde_json::json!({ "scan_job_id": scan_job_id })))
}
