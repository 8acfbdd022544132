//! Cross-module scenario tests: canonical classification, a duration tie, a
//! disc-structure layout, job dependency and retry, a locked asset slot
//! surviving the enrich-metadata job handler, and soft-delete plus
//! restore/cleanup.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use curator::classifier::{classify, decide, ProcessingStatus};
use curator::facts::video_probe::VideoStreamFacts;
use curator::facts::{
    gather_all_facts, ContextFacts, DirectoryScan, DiscStructure, FileRecord, FilenameFacts,
    NoProbeCache, TextFacts, VideoFacts, VideoProbe,
};
use curator::identify::{ProviderClient, ProviderMetadata, SearchResult};
use curator::jobs::{registry, HandlerDependencies, JobHandler};
use curator::models::job::EnqueueJob;
use curator::models::locks::{LockPolicy, StandardLockPolicy};
use curator::models::movie::{IdentificationStatus, Movie, MoviePatch};
use curator::models::provider_asset::CandidateAsset;
use curator::models::Slot;
use curator::repo::Database;

struct FakeVideoProbe;

#[async_trait]
impl VideoProbe for FakeVideoProbe {
    async fn probe(&self, path: &std::path::Path) -> anyhow::Result<VideoFacts> {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        let duration_secs = if name.contains("trailer") {
            180.0
        } else if name == "movie-a.mkv" || name == "movie-b.mkv" {
            3600.0
        } else {
            7200.0
        };
        Ok(VideoFacts {
            duration_secs,
            video_streams: vec![VideoStreamFacts {
                codec: "h264".to_string(),
                width: 1920,
                height: 1080,
                fps: 24.0,
                bitrate: None,
                profile: None,
                color_space: None,
                hdr_format: None,
            }],
            audio_streams: vec![],
            subtitle_streams: vec![],
        })
    }
}

fn write_image(path: &std::path::Path, width: u32, height: u32) {
    image::RgbImage::new(width, height).save(path).expect("write test image");
}

/// A clean single-feature directory with poster, fanart and an NFO carrying a
/// TMDB id classifies as CAN_PROCESS at full confidence.
#[tokio::test]
async fn canonical_directory_classifies_at_full_confidence() {
    let dir = tempfile::tempdir().unwrap();
    let movie_dir = dir.path().join("Inception (2010)");
    std::fs::create_dir_all(&movie_dir).unwrap();

    std::fs::write(movie_dir.join("Inception (2010).mkv"), b"").unwrap();
    std::fs::write(movie_dir.join("Inception (2010)-trailer.mkv"), b"").unwrap();
    write_image(&movie_dir.join("Inception (2010)-poster.jpg"), 1000, 1500);
    write_image(&movie_dir.join("Inception (2010)-fanart.jpg"), 1920, 1080);
    std::fs::write(
        movie_dir.join("Inception (2010).nfo"),
        br#"<movie><uniqueid type="tmdb">27205</uniqueid></movie>"#,
    )
    .unwrap();

    let scan = gather_all_facts(&movie_dir, Arc::new(NoProbeCache), Arc::new(FakeVideoProbe))
        .await
        .unwrap();

    let classification = classify(&scan, None);
    let decision = decide(&classification);

    let main = classification.main_movie.as_ref().expect("main movie detected");
    assert_eq!(main.duration_secs, 7200.0);
    // Two videos are present (feature + trailer); once the trailer is
    // excluded there is exactly one non-excluded candidate left, which wins
    // at 95 rather than the single-file 100.
    assert_eq!(main.confidence, 95);
    assert_eq!(classification.trailers.len(), 1);
    assert_eq!(classification.tmdb_id, Some(27205));

    let slots: HashSet<Slot> = classification.images.iter().map(|(slot, _)| *slot).collect();
    assert!(slots.contains(&Slot::Poster));
    assert!(slots.contains(&Slot::Fanart));

    assert_eq!(decision.status, ProcessingStatus::CanProcess);
    assert_eq!(decision.confidence, 100);
}

/// Two same-length, non-excluded videos leave no main movie and force manual
/// review.
#[tokio::test]
async fn duration_tie_forces_manual_required() {
    let dir = tempfile::tempdir().unwrap();
    let movie_dir = dir.path().join("Ambiguous");
    std::fs::create_dir_all(&movie_dir).unwrap();

    std::fs::write(movie_dir.join("movie-a.mkv"), b"").unwrap();
    std::fs::write(movie_dir.join("movie-b.mkv"), b"").unwrap();

    let scan = gather_all_facts(&movie_dir, Arc::new(NoProbeCache), Arc::new(FakeVideoProbe))
        .await
        .unwrap();
    let classification = classify(&scan, None);
    let decision = decide(&classification);

    assert!(classification.main_movie.is_none());
    assert_eq!(decision.status, ProcessingStatus::ManualRequired);
    assert_eq!(decision.confidence, 0);
}

/// An NFO under `BDMV/` still resolves at full confidence as the directory's
/// only text candidate (exercised at the pure classifier level, the way the
/// classifier's own submodule tests build a `DirectoryScan` by hand rather
/// than walking a real disc image).
#[tokio::test]
async fn disc_structure_nfo_gets_full_confidence() {
    let nfo = FileRecord {
        filesystem: curator::facts::FilesystemFacts {
            absolute_path: PathBuf::from("/movies/The Matrix/BDMV/index.nfo"),
            basename: "index.nfo".to_string(),
            extension: "nfo".to_string(),
            size_bytes: 512,
            parent_dir: PathBuf::from("/movies/The Matrix/BDMV"),
            modified: None,
            created: None,
        },
        filename: FilenameFacts::default(),
        image: None,
        video: None,
        text: Some(TextFacts {
            tmdb_id: Some(603),
            imdb_id: None,
            is_nfo_xml: true,
            is_subtitle: false,
            subtitle_language: None,
        }),
        context: ContextFacts::default(),
    };

    let scan = DirectoryScan {
        dir_path: PathBuf::from("/movies/The Matrix"),
        disc_structure: DiscStructure::Bdmv,
        legacy_dirs: vec![],
        files: vec![nfo],
        scan_started_at: Utc::now(),
        scan_completed_at: Utc::now(),
        processing_ms: 0,
    };

    let classification = classify(&scan, None);
    let nfo = classification.nfo.expect("nfo detected");
    assert_eq!(nfo.confidence, 100);
    assert_eq!(nfo.tmdb_id, Some(603));
    assert_eq!(classification.tmdb_id, Some(603));
}

async fn memory_db() -> Database {
    let pool = SqlitePoolOptions::new().max_connections(1).connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Database::from_pool(pool)
}

async fn seed_library(db: &Database) -> Uuid {
    let library_id = Uuid::new_v4();
    sqlx::query("INSERT INTO libraries (id, name, root_path) VALUES (?, ?, ?)")
        .bind(library_id.to_string())
        .bind("Movies")
        .bind("/movies")
        .execute(db.pool())
        .await
        .unwrap();
    library_id
}

fn sample_movie(library_id: Uuid) -> Movie {
    let now = Utc::now();
    Movie {
        id: Uuid::new_v4(),
        library_id,
        file_path: "/movies/Inception (2010)/Inception (2010).mkv".to_string(),
        file_name: "Inception (2010).mkv".to_string(),
        file_size: 9_000_000_000,
        file_hash: None,
        tmdb_id: Some(27205),
        imdb_id: None,
        title: "Inception".to_string(),
        original_title: None,
        sort_title: None,
        tagline: None,
        plot: None,
        outline: None,
        runtime_minutes: None,
        year: Some(2010),
        release_date: None,
        content_rating: None,
        provider_rating: None,
        user_rating: None,
        monitored: true,
        identification_status: IdentificationStatus::Identified,
        enrichment_priority: 5,
        enriched_at: None,
        published_at: None,
        deleted_at: None,
        locks: Default::default(),
        created_at: now,
        updated_at: now,
    }
}

/// J2 depends on J1 and fails twice with a transient error before completing;
/// J3 (depends on J2) is never eligible until J2 completes, and J1 is always
/// picked up first.
#[tokio::test]
async fn job_dependency_and_retry() {
    let db = memory_db().await;
    let jobs = db.jobs();

    let j1 = jobs.enqueue(curator::models::job::EnqueueJob::new("directory-scan", serde_json::json!({}))).await.unwrap();
    let j2 = jobs
        .enqueue(curator::models::job::EnqueueJob::new("enrich-metadata", serde_json::json!({})).depends_on([j1]))
        .await
        .unwrap();
    let j3 = jobs
        .enqueue(curator::models::job::EnqueueJob::new("publish", serde_json::json!({})).depends_on([j2]))
        .await
        .unwrap();

    // J2 and J3 are not eligible while J1 is still pending.
    let picked = jobs.pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, j1);
    jobs.complete(j1, None).await.unwrap();

    // J1 done: J2 becomes eligible, J3 still is not (J2 isn't completed yet).
    let picked = jobs.pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, j2);

    jobs.fail(j2, "transient: provider timeout", false).await.unwrap();
    let after_first_failure = jobs.get(j2).await.unwrap().unwrap();
    assert_eq!(after_first_failure.status, curator::models::job::JobStatus::Retrying);
    assert_eq!(after_first_failure.retry_count, 1);

    // Not due yet (next_retry_at is ~2s out) and J3 is still blocked.
    assert!(jobs.pick_next("worker-1").await.unwrap().is_none());

    sqlx::query("UPDATE jobs SET next_retry_at = datetime('now', '-1 second') WHERE id = ?")
        .bind(j2.to_string())
        .execute(db.pool())
        .await
        .unwrap();

    let picked = jobs.pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, j2);
    jobs.fail(j2, "transient: provider timeout", false).await.unwrap();
    let after_second_failure = jobs.get(j2).await.unwrap().unwrap();
    assert_eq!(after_second_failure.retry_count, 2);
    assert_eq!(after_second_failure.status, curator::models::job::JobStatus::Retrying);

    sqlx::query("UPDATE jobs SET next_retry_at = datetime('now', '-1 second') WHERE id = ?")
        .bind(j2.to_string())
        .execute(db.pool())
        .await
        .unwrap();

    let picked = jobs.pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, j2);
    jobs.complete(j2, None).await.unwrap();

    let picked = jobs.pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, j3);
}

/// A locked title survives an unforced automation write and only yields when
/// the caller forces it.
#[tokio::test]
async fn locked_title_survives_unforced_automation_write() {
    let db = memory_db().await;
    let library_id = seed_library(&db).await;
    let movies = db.movies();

    let mut movie = sample_movie(library_id);
    movie.locks.lock("title");
    movies.create(&movie).await.unwrap();

    let patch = MoviePatch { title: Some("Some Other Title".to_string()), ..Default::default() };
    let err = movies.apply_patch(movie.id, &patch, false, false).await.unwrap_err();
    assert_eq!(err.kind(), curator::error::ErrorKind::Conflict);

    let unchanged = movies.get(movie.id).await.unwrap().unwrap();
    assert_eq!(unchanged.title, "Inception");

    movies.apply_patch(movie.id, &patch, false, true).await.unwrap();
    let forced = movies.get(movie.id).await.unwrap().unwrap();
    assert_eq!(forced.title, "Some Other Title");

    let policy = StandardLockPolicy;
    assert!(policy.check(&unchanged.locks, "title", false).is_err());
    assert!(policy.check(&unchanged.locks, "plot", false).is_ok());
}

struct FakeEnrichProvider {
    assets: Vec<CandidateAsset>,
}

#[async_trait]
impl ProviderClient for FakeEnrichProvider {
    async fn search(&self, _title: &str, _year: Option<i32>) -> curator::error::Result<Vec<SearchResult>> {
        unimplemented!("enrich-metadata never calls search")
    }

    async fn fetch_metadata(&self, provider_id: i32) -> curator::error::Result<ProviderMetadata> {
        Ok(ProviderMetadata {
            provider_id,
            title: "Inception".to_string(),
            original_title: None,
            tagline: None,
            plot: Some("A thief who steals corporate secrets.".to_string()),
            runtime_minutes: Some(148),
            release_date: None,
            content_rating: None,
            provider_rating: None,
            imdb_id: None,
            genres: vec![],
            studios: vec![],
        })
    }

    async fn fetch_assets(&self, _provider_id: i32) -> curator::error::Result<Vec<CandidateAsset>> {
        Ok(self.assets.clone())
    }
}

/// A locked poster slot survives an `enrich-metadata` run: the job handler
/// finds a candidate poster but skips selecting/caching it since the slot is
/// locked, while the metadata fields it's free to touch are still updated.
#[tokio::test]
async fn locked_poster_slot_survives_enrich_metadata_job() {
    let db = memory_db().await;
    let library_id = seed_library(&db).await;
    let movies = db.movies();

    let mut movie = sample_movie(library_id);
    movie.locks.lock_slot(Slot::Poster);
    movies.create(&movie).await.unwrap();

    let deps = HandlerDependencies {
        db: db.clone(),
        cache: Arc::new(curator::cache::CacheStore::new(tempfile::tempdir().unwrap().into_path())),
        broadcaster: curator::ws::Broadcaster::new(),
        provider: Arc::new(FakeEnrichProvider {
            assets: vec![CandidateAsset {
                slot: Slot::Poster,
                provider_name: "tmdb".to_string(),
                provider_url: "https://image.tmdb.org/t/p/original/poster.jpg".to_string(),
                width: Some(1000),
                height: Some(1500),
                language: None,
                vote_average: Some(8.0),
                perceptual_hash: None,
            }],
        }),
        video_probe: Arc::new(FakeVideoProbe),
        config: Arc::new(curator::config::Config {
            data_dir: "./data".to_string(),
            database_url: "sqlite::memory:".to_string(),
            tmdb_api_key: None,
            worker_count: 1,
            poll_interval_secs: 5,
            retention_days: 30,
            phash_distance: 5,
            auto_enrich: true,
            auto_publish: false,
            fetch_provider_assets: true,
            auto_select_assets: true,
            unknown_files_auto_recycle: false,
        }),
        http: reqwest::Client::new(),
    };

    let handler = registry().get("enrich-metadata").expect("enrich-metadata registered").clone();
    let job = db
        .jobs()
        .enqueue(EnqueueJob::new("enrich-metadata", serde_json::json!({ "movie_id": movie.id })))
        .await
        .unwrap();
    let picked = db.jobs().pick_next("worker-1").await.unwrap().unwrap();
    assert_eq!(picked.id, job);

    let outcome = handler.handle(&picked, &deps).await;
    assert!(matches!(outcome, curator::jobs::JobOutcome::Completed(_)), "enrich-metadata should succeed");

    let enriched = movies.get(movie.id).await.unwrap().unwrap();
    assert_eq!(enriched.plot.as_deref(), Some("A thief who steals corporate secrets."));
    assert_eq!(enriched.identification_status, IdentificationStatus::Enriched);

    let entity = curator::models::EntityRef::Movie(movie.id);
    assert!(db.provider_assets().list_for_slot(entity, Slot::Poster).await.unwrap().is_empty());
    assert!(db.cache_files().list_for_entity(entity, Some(Slot::Poster)).await.unwrap().is_empty());
}

/// A soft-deleted movie disappears from the visible list, restoring clears
/// it, and past the retention window `cleanup` hard-deletes it.
#[tokio::test]
async fn soft_delete_restore_and_cleanup() {
    let db = memory_db().await;
    let library_id = seed_library(&db).await;
    let movies = db.movies();

    let movie = sample_movie(library_id);
    movies.create(&movie).await.unwrap();

    let now = Utc::now();
    assert_eq!(movies.list_visible(library_id, now).await.unwrap().len(), 1);

    movies.soft_delete(movie.id, 30).await.unwrap();
    assert!(movies.list_visible(library_id, now).await.unwrap().is_empty());

    movies.restore(movie.id).await.unwrap();
    assert_eq!(movies.list_visible(library_id, now).await.unwrap().len(), 1);

    movies.soft_delete(movie.id, 30).await.unwrap();
    let past_retention = now + chrono::Duration::days(31);
    let deleted = movies.hard_delete_past_retention(past_retention).await.unwrap();
    assert_eq!(deleted, vec![movie.id]);
    assert!(movies.get(movie.id).await.unwrap().is_none());
}
