//! Text classification ( "Text classification").

use std::collections::HashSet;
use std::path::PathBuf;

use super::{Classification, ClassifiedFile, NfoFile};
use crate::facts::DirectoryScan;

pub fn classify_text(scan: &DirectoryScan, result: &mut Classification, claimed: &mut HashSet<PathBuf>) {
    let mut best_nfo: Option<NfoFile> = None;

    for file in &scan.files {
        let Some(text) = &file.text else { continue };
        let ext = &file.filesystem.extension;

        if ext == "nfo" {
            if text.is_nfo_xml || text.tmdb_id.is_some() || text.imdb_id.is_some() {
                let confidence = if is_expected_nfo_location(scan, file.path()) { 100 } else { 90 };
                let candidate = NfoFile {
                    path: file.path().to_path_buf(),
                    confidence,
                    tmdb_id: text.tmdb_id,
                    imdb_id: text.imdb_id.clone(),
                };
                claimed.insert(file.path().to_path_buf());
                if best_nfo.as_ref().map(|b| candidate.confidence > b.confidence).unwrap_or(true) {
                    best_nfo = Some(candidate);
                }
            }
            // Other .nfo files without extractable ids fall through to unknown.
        } else if text.is_subtitle {
            claimed.insert(file.path().to_path_buf());
            result.subtitles.push(ClassifiedFile { path: file.path().to_path_buf(), confidence: 90 });
        }
    }

    result.nfo = best_nfo;
}

fn is_expected_nfo_location(scan: &DirectoryScan, path: &std::path::Path) -> bool {
    match scan.disc_structure.root_dir() {
        Some(root) => path.parent().and_then(|p| p.file_name()).and_then(|n| n.to_str()) == Some(root),
        None => true,
    }
}
