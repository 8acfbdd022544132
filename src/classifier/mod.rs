//! The classifier: deterministic rules over a `DirectoryScan` plus an
//! optional webhook hint, producing a `Classification` and a
//! `ProcessingDecision`.

mod audio;
mod decision;
mod image;
mod text;
mod video;

pub use decision::{decide, ProcessingDecision, ProcessingStatus};
pub use image::{expected_image_patterns, ImageMatch};
pub use video::{classify_videos, VideoRole};

use std::path::PathBuf;

use crate::facts::DirectoryScan;
use crate::models::Slot;

#[derive(Debug, Clone)]
pub struct MainMovie {
    pub path: PathBuf,
    pub duration_secs: f64,
    pub confidence: u8,
}

#[derive(Debug, Clone)]
pub struct ClassifiedFile {
    pub path: PathBuf,
    pub confidence: u8,
}

#[derive(Debug, Clone)]
pub struct NfoFile {
    pub path: PathBuf,
    pub confidence: u8,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub main_movie: Option<MainMovie>,
    pub trailers: Vec<ClassifiedFile>,
    pub deleted_scenes: Vec<ClassifiedFile>,
    pub images: Vec<(Slot, ClassifiedFile)>,
    pub subtitles: Vec<ClassifiedFile>,
    pub nfo: Option<NfoFile>,
    pub theme_audio: Option<PathBuf>,
    pub unknown: Vec<PathBuf>,
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
}

/// Pure: identical `(scan, hint)` pairs always produce an equal `Classification`
/// ('s closing sentence,  "Classification is pure").
pub fn classify(scan: &DirectoryScan, hint: Option<&str>) -> Classification {
    let mut result = Classification::default();
    let mut claimed: std::collections::HashSet<PathBuf> = std::collections::HashSet::new();

    // Priority order: disc detection is implicit in `scan.disc_structure` and
    // affects pattern generation below; text -> videos -> images -> audio ->
    // legacy -> unknown bucket.
    text::classify_text(scan, &mut result, &mut claimed);
    video::classify_videos_into(scan, hint, &mut result, &mut claimed);
    image::classify_images_into(scan, &mut result, &mut claimed);
    audio::classify_audio_into(scan, &mut result, &mut claimed);

    if let Some(nfo) = &result.nfo {
        result.tmdb_id = result.tmdb_id.or(nfo.tmdb_id);
        result.imdb_id = result.imdb_id.clone().or(nfo.imdb_id.clone());
    }

    for file in &scan.files {
        if !claimed.contains(file.path()) {
            result.unknown.push(file.path().to_path_buf());
        }
    }

    result
}
