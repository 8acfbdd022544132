//! Main-movie rule and trailer/deleted-scene classification.

use std::collections::HashSet;
use std::path::PathBuf;

use super::{Classification, ClassifiedFile, MainMovie};
use crate::facts::{DirectoryScan, FileRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRole {
    Main,
    Trailer,
    DeletedScene,
}

const TIE_TOLERANCE_SECS: f64 = 1.0;

struct Candidate<'a> {
    record: &'a FileRecord,
    duration: f64,
}

pub fn classify_videos_into(
    scan: &DirectoryScan,
    hint: Option<&str>,
    result: &mut Classification,
    claimed: &mut HashSet<PathBuf>,
) {
    let videos: Vec<&FileRecord> = scan
        .files
        .iter()
        .filter(|f| f.video.as_ref().is_some_and(|v| v.has_video()))
        .collect();

    let main = classify_videos(&videos, hint);

    if let Some(winner) = &main {
        claimed.insert(winner.path.clone());
        result.main_movie = Some(winner.clone());
    }

    for file in &videos {
        if claimed.contains(file.path()) {
            continue;
        }
        if file.filename.excluded {
            claimed.insert(file.path().to_path_buf());
            match file.filename.exclusion_keyword.as_deref() {
                Some("deleted") => result.deleted_scenes.push(ClassifiedFile { path: file.path().to_path_buf(), confidence: 90 }),
                _ => result.trailers.push(ClassifiedFile { path: file.path().to_path_buf(), confidence: 90 }),
            }
        }
    }
}

/// Implements the table in  exactly.
pub fn classify_videos(videos: &[&FileRecord], hint: Option<&str>) -> Option<MainMovie> {
    if videos.is_empty() {
        return None;
    }

    if let Some(hint) = hint {
        if let Some(matched) = videos.iter().find(|f| {
            f.filesystem.basename == hint && !f.filename.excluded
        }) {
            return Some(to_main_movie(matched, 100));
        }
    }

    let non_excluded: Vec<&&FileRecord> = videos.iter().filter(|f| !f.filename.excluded).collect();

    if videos.len() == 1 {
        return if videos[0].filename.excluded { None } else { Some(to_main_movie(videos[0], 100)) };
    }

    match non_excluded.len() {
        0 => None,
        1 => Some(to_main_movie(non_excluded[0], 95)),
        _ => pick_longest(&non_excluded),
    }
}

fn pick_longest(candidates: &[&&FileRecord]) -> Option<MainMovie> {
    let mut ranked: Vec<Candidate> = candidates
        .iter()
        .map(|f| Candidate { record: f, duration: f.video.as_ref().unwrap().duration_secs })
        .collect();
    ranked.sort_by(|a, b| b.duration.partial_cmp(&a.duration).unwrap_or(std::cmp::Ordering::Equal));

    let longest = &ranked[0];
    if ranked.len() > 1 && (longest.duration - ranked[1].duration).abs() < TIE_TOLERANCE_SECS {
        return None;
    }
    Some(to_main_movie(longest.record, 90))
}

fn to_main_movie(record: &FileRecord, confidence: u8) -> MainMovie {
    MainMovie {
        path: record.path().to_path_buf(),
        duration_secs: record.video.as_ref().map(|v| v.duration_secs).unwrap_or(0.0),
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FilenameFacts, FilesystemFacts, VideoFacts, ContextFacts};

    fn video_record(path: &str, duration: f64, excluded: bool, keyword: Option<&str>) -> FileRecord {
        FileRecord {
            filesystem: FilesystemFacts {
                absolute_path: path.into(),
                basename: path.rsplit('/').next().unwrap().to_string(),
                extension: "mkv".to_string(),
                size_bytes: 1_000_000,
                parent_dir: "/movies/Inception (2010)".into(),
                modified: None,
                created: None,
            },
            filename: FilenameFacts { excluded, exclusion_keyword: keyword.map(|s| s.to_string()), ..Default::default() },
            image: None,
            video: Some(VideoFacts {
                duration_secs: duration,
                video_streams: vec![crate::facts::video_probe::VideoStreamFacts {
                    codec: "h264".into(),
                    width: 1920,
                    height: 1080,
                    fps: 24.0,
                    bitrate: None,
                    profile: None,
                    color_space: None,
                    hdr_format: None,
                }],
                ..Default::default()
            }),
            text: None,
            context: ContextFacts::default(),
        }
    }

    #[test]
    fn single_non_excluded_video_wins_at_full_confidence() {
        let r = video_record("/m/Inception (2010).mkv", 7200.0, false, None);
        let videos = vec![&r];
        let main = classify_videos(&videos, None).unwrap();
        assert_eq!(main.confidence, 100);
    }

    #[test]
    fn single_excluded_video_is_not_main() {
        let r = video_record("/m/Inception (2010)-sample.mkv", 120.0, true, Some("sample"));
        let videos = vec![&r];
        assert!(classify_videos(&videos, None).is_none());
    }

    #[test]
    fn duration_tie_within_one_second_yields_none() {
        let a = video_record("/m/a.mkv", 3600.0, false, None);
        let b = video_record("/m/b.mkv", 3600.5, false, None);
        let videos = vec![&a, &b];
        assert!(classify_videos(&videos, None).is_none());
    }

    #[test]
    fn longest_wins_when_difference_exceeds_tolerance() {
        let a = video_record("/m/a.mkv", 7200.0, false, None);
        let b = video_record("/m/a-trailer.mkv", 180.0, true, Some("trailer"));
        let videos = vec![&a, &b];
        let main = classify_videos(&videos, None).unwrap();
        assert_eq!(main.path, PathBuf::from("/m/a.mkv"));
        assert_eq!(main.confidence, 95);
    }

    #[test]
    fn webhook_hint_overrides_duration_ranking() {
        let a = video_record("/m/a.mkv", 100.0, false, None);
        let b = video_record("/m/b.mkv", 7200.0, false, None);
        let videos = vec![&a, &b];
        let main = classify_videos(&videos, Some("a.mkv")).unwrap();
        assert_eq!(main.path, PathBuf::from("/m/a.mkv"));
        assert_eq!(main.confidence, 100);
    }
}
