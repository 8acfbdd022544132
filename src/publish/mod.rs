//! Library publisher (component E): copies a selected cache file into
//! the library layout and keeps the `library_files` table in sync.
//!
//! Grounded in the teacher's `db/movies.rs` CRUD idiom for the movie row and
//! `services/ffmpeg.rs`-adjacent patterns for path construction; publishing
//! itself has no teacher analogue (the teacher serves assets straight from
//! its cache table) so the copy-and-link sequence is newly designed.

mod nfo;

pub use nfo::render_nfo;

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::Result;
use crate::facts::DiscStructure;
use crate::hash::content_hash_file;
use crate::models::cache_file::{CacheFile, LibraryFile};
use crate::models::slot::Slot;
use crate::models::Movie;
use crate::repo::cache_files::CacheFileRepository;

pub struct Publisher<'a> {
    cache_files: &'a CacheFileRepository,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Target didn't exist, or existed with a different hash and was replaced.
    Written,
    /// Target already held identical bytes; only the DB row was ensured.
    Unchanged,
}

impl<'a> Publisher<'a> {
    pub fn new(cache_files: &'a CacheFileRepository) -> Self {
        Self { cache_files }
    }

    /// Publishes a single slot. Copy, never move: the cache remains
    /// the source of truth. Publishing one slot never touches another slot's
    /// file, so a partial failure leaves prior library files untouched.
    pub async fn publish_slot(
        &self,
        movie: &Movie,
        movie_dir: &Path,
        disc_structure: DiscStructure,
        cache_file: &CacheFile,
        slot: Slot,
    ) -> Result<(PublishOutcome, LibraryFile)> {
        let target = library_path(movie, movie_dir, disc_structure, slot, &extension_of(&cache_file.file_name));
        self.write_target(cache_file, &target).await
    }

    /// Publishes the regenerated NFO. Unlike an image slot, the NFO has no
    /// `-{slot}` suffix and (on a disc layout) lives at the disc root rather
    /// than alongside the other per-slot assets.
    pub async fn publish_nfo(
        &self,
        movie: &Movie,
        movie_dir: &Path,
        disc_structure: DiscStructure,
        cache_file: &CacheFile,
    ) -> Result<(PublishOutcome, LibraryFile)> {
        let target = nfo_path(movie, movie_dir, disc_structure);
        self.write_target(cache_file, &target).await
    }

    async fn write_target(&self, cache_file: &CacheFile, target: &Path) -> Result<(PublishOutcome, LibraryFile)> {
        let outcome = if target.exists() {
            let existing_hash = content_hash_file(target)?;
            if existing_hash == cache_file.content_hash {
                PublishOutcome::Unchanged
            } else {
                tokio::fs::remove_file(target).await?;
                copy_from_cache(cache_file, target).await?;
                PublishOutcome::Written
            }
        } else {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            copy_from_cache(cache_file, target).await?;
            PublishOutcome::Written
        };

        self.cache_files.touch_last_accessed(cache_file.id).await?;

        let library_file = LibraryFile {
            id: Uuid::new_v4(),
            cache_file_id: cache_file.id,
            file_path: target.to_string_lossy().to_string(),
            published_at: chrono::Utc::now(),
        };

        Ok((outcome, library_file))
    }
}

async fn copy_from_cache(cache_file: &CacheFile, target: &Path) -> Result<()> {
    let bytes = tokio::fs::read(&cache_file.file_path).await?;
    let tmp = target.with_extension(format!("{}.tmp", std::process::id()));
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, target).await?;
    Ok(())
}

fn extension_of(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin")
        .to_string()
}

/// Library path for a slot, following the configured library layout.
pub fn library_path(movie: &Movie, movie_dir: &Path, disc_structure: DiscStructure, slot: Slot, ext: &str) -> PathBuf {
    match disc_structure.root_dir() {
        Some(root) => movie_dir.join(root).join(format!("{}.{ext}", slot.as_str())),
        None => {
            let base = Path::new(&movie.file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&movie.title);
            movie_dir.join(format!("{base}-{}.{ext}", slot.as_str()))
        }
    }
}

/// NFO path: bare `{movieBasename}.nfo` on a standard layout, or
/// `{discRoot}/index.nfo` on a disc structure (no per-slot suffix).
pub fn nfo_path(movie: &Movie, movie_dir: &Path, disc_structure: DiscStructure) -> PathBuf {
    match disc_structure.root_dir() {
        Some(root) => movie_dir.join(root).join("index.nfo"),
        None => {
            let base = Path::new(&movie.file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or(&movie.title);
            movie_dir.join(format!("{base}.nfo"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::locks::FieldLocks;
    use crate::models::IdentificationStatus;

    fn sample_movie() -> Movie {
        Movie {
            id: Uuid::new_v4(),
            library_id: Uuid::new_v4(),
            file_path: "/movies/Inception (2010)/Inception (2010).mkv".into(),
            file_name: "Inception (2010).mkv".into(),
            file_size: 1,
            file_hash: None,
            tmdb_id: Some(27205),
            imdb_id: None,
            title: "Inception".into(),
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
            locks: FieldLocks::default(),
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn standard_layout_names_files_after_movie_basename() {
        let movie = sample_movie();
        let dir = Path::new("/movies/Inception (2010)");
        let p = library_path(&movie, dir, DiscStructure::None, Slot::Poster, "jpg");
        assert_eq!(p, PathBuf::from("/movies/Inception (2010)/Inception (2010)-poster.jpg"));
    }

    #[test]
    fn disc_structure_layout_uses_short_names() {
        let movie = sample_movie();
        let dir = Path::new("/movies/Inception (2010)");
        let p = library_path(&movie, dir, DiscStructure::Bdmv, Slot::Fanart, "jpg");
        assert_eq!(p, PathBuf::from("/movies/Inception (2010)/BDMV/fanart.jpg"));
    }

    #[test]
    fn nfo_path_has_no_slot_suffix_on_standard_layout() {
        let movie = sample_movie();
        let dir = Path::new("/movies/Inception (2010)");
        let p = nfo_path(&movie, dir, DiscStructure::None);
        assert_eq!(p, PathBuf::from("/movies/Inception (2010)/Inception (2010).nfo"));
    }

    #[test]
    fn nfo_path_lives_at_disc_root() {
        let movie = sample_movie();
        let dir = Path::new("/movies/Inception (2010)");
        let p = nfo_path(&movie, dir, DiscStructure::Bdmv);
        assert_eq!(p, PathBuf::from("/movies/Inception (2010)/BDMV/index.nfo"));
    }
}
