//! `gatherAllFacts`: walks one directory and produces a typed
//! `DirectoryScan`. Does no I/O beyond the filesystem, the video/image
//! probes, and a partial read of text files.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};

use super::filename::{self, FilenameFacts};
use super::filesystem::{self, DiscStructure, FilesystemFacts, LegacyDirInfo};
use super::image_probe::{self, ImageFacts, IMAGE_EXTENSIONS};
use super::text_probe::{self, TextFacts, TEXT_EXTENSIONS};
use super::video_probe::{VideoFacts, VideoProbe, VIDEO_EXTENSIONS};
use crate::hash::{content_hash_file, quick_hash_file};

/// A cached probe result, keyed by quick-hash but carrying the full content
/// hash the quick-hash was computed alongside. The full hash is what a hit
/// gets re-verified against before it's trusted.
#[derive(Debug, Clone)]
pub struct CachedVideoProbe {
    pub content_hash: String,
    pub facts: VideoFacts,
}

/// Looked up by quick-hash to skip re-probing a video file already seen.
/// Implemented over the cache repository in production; tests use an
/// in-memory stub.
#[async_trait::async_trait]
pub trait ProbeCache: Send + Sync {
    async fn lookup_by_quick_hash(&self, quick_hash: &str) -> Option<CachedVideoProbe>;
}

pub struct NoProbeCache;

#[async_trait::async_trait]
impl ProbeCache for NoProbeCache {
    async fn lookup_by_quick_hash(&self, _quick_hash: &str) -> Option<CachedVideoProbe> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContextFacts {
    /// 0 = largest file in the directory.
    pub size_rank: u32,
    /// 0 = longest-duration video in the directory; `None` for non-video files.
    pub duration_rank: Option<u32>,
    pub is_longest_video: bool,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub filesystem: FilesystemFacts,
    pub filename: FilenameFacts,
    pub image: Option<ImageFacts>,
    pub video: Option<VideoFacts>,
    pub text: Option<TextFacts>,
    pub context: ContextFacts,
}

impl FileRecord {
    pub fn path(&self) -> &Path {
        &self.filesystem.absolute_path
    }
}

#[derive(Debug, Clone)]
pub struct DirectoryScan {
    pub dir_path: PathBuf,
    pub disc_structure: DiscStructure,
    pub legacy_dirs: Vec<String>,
    pub files: Vec<FileRecord>,
    pub scan_started_at: DateTime<Utc>,
    pub scan_completed_at: DateTime<Utc>,
    pub processing_ms: u64,
}

/// Walks `dir_path` (and its legacy `extrafanarts`/`extrathumbs` subdirs) and
/// emits one `FileRecord` per file. Filesystem errors on the directory itself
/// are fatal; per-file probe failures are not.
pub async fn gather_all_facts(
    dir_path: &Path,
    probe_cache: Arc<dyn ProbeCache>,
    video_probe: Arc<dyn VideoProbe>,
) -> std::io::Result<DirectoryScan> {
    let started = Utc::now();
    let instant = Instant::now();

    let disc_structure = filesystem::detect_disc_structure(dir_path);
    let legacy: Vec<LegacyDirInfo> = filesystem::scan_legacy_dirs(dir_path)?;
    let legacy_dirs: Vec<String> = legacy.iter().map(|l| l.name.clone()).collect();

    let mut candidate_paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir_path)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            let name = entry.file_name();
            if let Some(name) = name.to_str() {
                if filesystem::ignore::is_ignored(name) {
                    continue;
                }
            }
            candidate_paths.push(entry.path());
        }
    }
    for legacy_dir in &legacy {
        candidate_paths.extend(legacy_dir.files.iter().cloned());
    }

    let mut files = Vec::with_capacity(candidate_paths.len());
    for path in candidate_paths {
        if let Some(record) = build_file_record(&path, probe_cache.as_ref(), video_probe.as_ref()).await {
            files.push(record);
        }
    }

    apply_context_ranks(&mut files);

    let completed = Utc::now();
    Ok(DirectoryScan {
        dir_path: dir_path.to_path_buf(),
        disc_structure,
        legacy_dirs,
        files,
        scan_started_at: started,
        scan_completed_at: completed,
        processing_ms: instant.elapsed().as_millis() as u64,
    })
}

async fn build_file_record(
    path: &Path,
    probe_cache: &dyn ProbeCache,
    video_probe: &dyn VideoProbe,
) -> Option<FileRecord> {
    let fs_facts = filesystem::probe(path).ok()?;
    let filename_facts = filename::extract(&fs_facts.basename);

    let image = if IMAGE_EXTENSIONS.contains(&fs_facts.extension.as_str()) {
        image_probe::probe(path).ok()
    } else {
        None
    };

    let video = if VIDEO_EXTENSIONS.contains(&fs_facts.extension.as_str()) {
        probe_video_cached(path, probe_cache, video_probe).await
    } else {
        None
    };

    let text = if TEXT_EXTENSIONS.contains(&fs_facts.extension.as_str()) {
        text_probe::probe(path).ok()
    } else {
        None
    };

    Some(FileRecord {
        filesystem: fs_facts,
        filename: filename_facts,
        image,
        video,
        text,
        context: ContextFacts::default(),
    })
}

/// A quick-hash hit is provisional until the full content hash is checked
/// against what the cache entry was stored under; on a mismatch (or any I/O
/// failure computing either hash) this falls back to a real probe rather
/// than trusting stale data.
async fn probe_video_cached(
    path: &Path,
    probe_cache: &dyn ProbeCache,
    video_probe: &dyn VideoProbe,
) -> Option<VideoFacts> {
    if let Ok(qh) = quick_hash_file(path) {
        if let Some(cached) = probe_cache.lookup_by_quick_hash(&qh).await {
            if let Ok(full_hash) = content_hash_file(path) {
                if full_hash == cached.content_hash {
                    return Some(cached.facts);
                }
            }
        }
    }
    video_probe.probe(path).await.ok()
}

/// Context pass: size-rank across all files, duration-rank across videos,
/// and the `isLongestVideo` flag.
fn apply_context_ranks(files: &mut [FileRecord]) {
    let mut by_size: Vec<usize> = (0..files.len()).collect();
    by_size.sort_by(|&a, &b| files[b].filesystem.size_bytes.cmp(&files[a].filesystem.size_bytes));
    for (rank, idx) in by_size.into_iter().enumerate() {
        files[idx].context.size_rank = rank as u32;
    }

    let mut video_indices: Vec<usize> = (0..files.len())
        .filter(|&i| files[i].video.as_ref().is_some_and(|v| v.has_video()))
        .collect();
    video_indices.sort_by(|&a, &b| {
        let da = files[a].video.as_ref().unwrap().duration_secs;
        let db = files[b].video.as_ref().unwrap().duration_secs;
        db.partial_cmp(&da).unwrap_or(std::cmp::Ordering::Equal)
    });
    for (rank, idx) in video_indices.iter().enumerate() {
        files[*idx].context.duration_rank = Some(rank as u32);
        if rank == 0 {
            files[*idx].context.is_longest_video = true;
        }
    }
}
