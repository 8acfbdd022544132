//! Audio classification ( "Audio").

use std::collections::HashSet;
use std::path::PathBuf;

use super::Classification;
use crate::facts::DirectoryScan;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "m4a", "aac", "ogg", "wav"];

pub fn classify_audio_into(scan: &DirectoryScan, result: &mut Classification, claimed: &mut HashSet<PathBuf>) {
    for file in &scan.files {
        if claimed.contains(file.path()) {
            continue;
        }
        if !AUDIO_EXTENSIONS.contains(&file.filesystem.extension.as_str()) {
            continue;
        }
        let stem = file
            .filesystem
            .basename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(&file.filesystem.basename);

        if stem.eq_ignore_ascii_case("theme") {
            claimed.insert(file.path().to_path_buf());
            result.theme_audio = Some(file.path().to_path_buf());
        }
        // Other audio falls through to the unknown bucket.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{ContextFacts, DiscStructure, FileRecord, FilenameFacts, FilesystemFacts};
    use chrono::Utc;

    fn audio_file(path: &str) -> FileRecord {
        let name = path.rsplit('/').next().unwrap();
        FileRecord {
            filesystem: FilesystemFacts {
                absolute_path: path.into(),
                basename: name.to_string(),
                extension: name.rsplit('.').next().unwrap().to_string(),
                size_bytes: 5_000_000,
                parent_dir: "/movies/Inception (2010)".into(),
                modified: None,
                created: None,
            },
            filename: FilenameFacts::default(),
            image: None,
            video: None,
            text: None,
            context: ContextFacts::default(),
        }
    }

    fn scan_with(files: Vec<FileRecord>) -> DirectoryScan {
        DirectoryScan {
            dir_path: "/movies/Inception (2010)".into(),
            disc_structure: DiscStructure::None,
            legacy_dirs: vec![],
            files,
            scan_started_at: Utc::now(),
            scan_completed_at: Utc::now(),
            processing_ms: 0,
        }
    }

    #[test]
    fn exact_theme_basename_matches_regardless_of_case() {
        let scan = scan_with(vec![audio_file("/movies/Inception (2010)/Theme.flac")]);
        let mut result = Classification::default();
        let mut claimed = HashSet::new();
        classify_audio_into(&scan, &mut result, &mut claimed);
        assert!(result.theme_audio.is_some());
    }

    #[test]
    fn other_audio_is_left_unclaimed() {
        let scan = scan_with(vec![audio_file("/movies/Inception (2010)/soundtrack.mp3")]);
        let mut result = Classification::default();
        let mut claimed = HashSet::new();
        classify_audio_into(&scan, &mut result, &mut claimed);
        assert!(result.theme_audio.is_none());
        assert!(claimed.is_empty());
    }
}
