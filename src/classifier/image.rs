//! Image slot classification.

use std::collections::HashSet;
use std::path::PathBuf;

use super::{Classification, ClassifiedFile};
use crate::facts::DirectoryScan;
use crate::models::slot::{dimension_spec, Slot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMatch {
    Exact,
    Keyword,
}

/// Generates the expected filename patterns for `slot` given the main-movie
/// basename (standard mode) or disc-structure short names.
pub fn expected_image_patterns(slot: Slot, base: Option<&str>, ext: &str) -> Vec<String> {
    let name = slot.as_str();
    let mut patterns = Vec::new();

    if let Some(base) = base {
        patterns.push(format!("{base}-{name}.{ext}"));
    }
    patterns.push(format!("{name}.{ext}"));
    for n in 1..=10 {
        patterns.push(format!("{name}{n}.{ext}"));
    }

    match slot {
        Slot::Poster => patterns.push(format!("folder.{ext}")),
        Slot::Fanart => patterns.push(format!("backdrop.{ext}")),
        Slot::Clearlogo => patterns.push("logo.png".to_string()),
        _ => {}
    }

    patterns
}

pub fn classify_images_into(scan: &DirectoryScan, result: &mut Classification, claimed: &mut HashSet<PathBuf>) {
    let base = result.main_movie.as_ref().and_then(|m| {
        m.path.file_stem().and_then(|s| s.to_str()).map(|s| s.to_string())
    });
    let disc_mode = scan.disc_structure.root_dir().is_some();

    for file in &scan.files {
        if claimed.contains(file.path()) {
            continue;
        }
        let Some(image) = &file.image else { continue };
        let lower_name = file.filesystem.basename.to_lowercase();
        let ext = &file.filesystem.extension;

        let mut best: Option<(Slot, u8)> = None;

        for slot in Slot::IMAGE_SLOTS {
            let base_for_slot = if disc_mode { None } else { base.as_deref() };
            let exact_patterns = expected_image_patterns(slot, base_for_slot, ext);
            let is_exact = exact_patterns.iter().any(|p| p.to_lowercase() == lower_name);

            let dims_ok = dimension_spec(slot)
                .map(|spec| spec.validate(image.width, image.height))
                .unwrap_or(false);

            let confidence = if is_exact {
                if dims_ok { 100 } else { 85 }
            } else if lower_name.contains(slot.as_str()) {
                let base_conf: u8 = if dims_ok { 80 } else { 60 };
                base_conf
            } else {
                continue;
            };

            if confidence < 80 {
                continue;
            }

            if best.map(|(_, c)| confidence > c).unwrap_or(true) {
                best = Some((slot, confidence));
            }
        }

        if let Some((slot, confidence)) = best {
            claimed.insert(file.path().to_path_buf());
            result.images.push((slot, ClassifiedFile { path: file.path().to_path_buf(), confidence }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::MainMovie;
    use crate::facts::{ContextFacts, DiscStructure, FilenameFacts, FilesystemFacts, ImageFacts};
    use chrono::Utc;

    fn image_file(path: &str, width: u32, height: u32) -> crate::facts::FileRecord {
        let name = path.rsplit('/').next().unwrap();
        let ext = name.rsplit('.').next().unwrap().to_string();
        crate::facts::FileRecord {
            filesystem: FilesystemFacts {
                absolute_path: path.into(),
                basename: name.to_string(),
                extension: ext,
                size_bytes: 10_000,
                parent_dir: "/movies/Inception (2010)".into(),
                modified: None,
                created: None,
            },
            filename: FilenameFacts::default(),
            image: Some(ImageFacts {
                width,
                height,
                aspect_ratio: width as f64 / height as f64,
                format: "rgb".to_string(),
                has_alpha: false,
                perceptual_hash: 0,
            }),
            video: None,
            text: None,
            context: ContextFacts::default(),
        }
    }

    fn scan_with(files: Vec<crate::facts::FileRecord>) -> DirectoryScan {
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
    fn exact_match_with_valid_dims_gets_full_confidence() {
        let scan = scan_with(vec![image_file("/movies/Inception (2010)/Inception (2010)-poster.jpg", 1000, 1500)]);
        let mut result = Classification {
            main_movie: Some(MainMovie { path: "/movies/Inception (2010)/Inception (2010).mkv".into(), duration_secs: 7200.0, confidence: 100 }),
            ..Default::default()
        };
        let mut claimed = HashSet::new();
        classify_images_into(&scan, &mut result, &mut claimed);
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].0, Slot::Poster);
        assert_eq!(result.images[0].1.confidence, 100);
    }

    #[test]
    fn keyword_match_without_valid_dims_is_below_the_emission_floor() {
        let scan = scan_with(vec![image_file("/movies/Inception (2010)/random-poster-crop.jpg", 100, 100)]);
        let mut result = Classification::default();
        let mut claimed = HashSet::new();
        classify_images_into(&scan, &mut result, &mut claimed);
        assert!(result.images.is_empty());
    }

    #[test]
    fn keyword_match_with_valid_dims_meets_the_emission_floor() {
        let scan = scan_with(vec![image_file("/movies/Inception (2010)/random-poster-crop.jpg", 1000, 1500)]);
        let mut result = Classification::default();
        let mut claimed = HashSet::new();
        classify_images_into(&scan, &mut result, &mut claimed);
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].1.confidence, 80);
    }
}
