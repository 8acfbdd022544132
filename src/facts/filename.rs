//! Filename token extraction.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilenameFacts {
    pub year: Option<i32>,
    pub resolution: Option<String>,
    pub codec: Option<String>,
    pub quality_tags: Vec<String>,
    pub audio_tags: Vec<String>,
    pub edition: Option<String>,
    pub excluded: bool,
    pub exclusion_keyword: Option<String>,
}

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[.(](19\d{2}|20\d{2})[\]).]").unwrap());
static RESOLUTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(480p|720p|1080p|2160p|4k|uhd|hd)\b").unwrap());
static CODEC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(x264|x265|h264|h265|hevc|avc)\b").unwrap());

const QUALITY_TAGS: &[&str] = &["BLURAY", "BLU-RAY", "REMUX", "WEBRIP", "WEB-DL", "HDTV", "DVDRIP"];
const AUDIO_TAGS: &[&str] = &["DTS", "ATMOS", "TRUEHD", "DDP", "AC3", "EAC3", "FLAC"];
const EDITION_TAGS: &[&str] = &[
    "Director's Cut",
    "Directors Cut",
    "Extended",
    "Unrated",
    "Theatrical",
    "Ultimate Edition",
    "Special Edition",
];

/// Three exclusion patterns: hyphen-separated `-kw`, underscore-separated
/// `_kw`, and (for `sample` only) a bare substring match.
const EXCLUSION_KEYWORDS: &[&str] = &[
    "trailer",
    "sample",
    "behindthescenes",
    "deleted",
    "featurette",
    "interview",
    "scene",
    "short",
];

pub fn extract(filename: &str) -> FilenameFacts {
    let year = YEAR_RE
        .captures(filename)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());

    let resolution = RESOLUTION_RE
        .find(filename)
        .map(|m| m.as_str().to_uppercase());

    let codec = CODEC_RE.find(filename).map(|m| m.as_str().to_uppercase());

    let upper = filename.to_uppercase();
    let quality_tags = QUALITY_TAGS
        .iter()
        .filter(|t| upper.contains(*t))
        .map(|t| t.to_string())
        .collect();
    let audio_tags = AUDIO_TAGS
        .iter()
        .filter(|t| word_boundary_contains(&upper, t))
        .map(|t| t.to_string())
        .collect();

    let edition = EDITION_TAGS
        .iter()
        .find(|t| filename.to_lowercase().contains(&t.to_lowercase()))
        .map(|t| t.to_string());

    let (excluded, exclusion_keyword) = detect_exclusion(filename);

    FilenameFacts {
        year,
        resolution,
        codec,
        quality_tags,
        audio_tags,
        edition,
        excluded,
        exclusion_keyword,
    }
}

fn word_boundary_contains(upper: &str, tag: &str) -> bool {
    upper.split(|c: char| !c.is_alphanumeric()).any(|w| w == tag)
}

/// Detects an exclusion keyword using the three patterns above: `-kw`,
/// `_kw`, and (sample only) a loose substring.
fn detect_exclusion(filename: &str) -> (bool, Option<String>) {
    let lower = filename.to_lowercase();
    for kw in EXCLUSION_KEYWORDS {
        let hyphen = format!("-{kw}");
        let underscore = format!("_{kw}");
        if lower.contains(&hyphen) || lower.contains(&underscore) {
            return (true, Some(kw.to_string()));
        }
        if *kw == "sample" && lower.contains("sample") {
            return (true, Some("sample".to_string()));
        }
    }
    (false, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_year_in_parens() {
        let f = extract("Inception (2010).mkv");
        assert_eq!(f.year, Some(2010));
    }

    #[test]
    fn detects_trailer_suffix() {
        let f = extract("Inception (2010)-trailer.mkv");
        assert!(f.excluded);
        assert_eq!(f.exclusion_keyword.as_deref(), Some("trailer"));
    }

    #[test]
    fn detects_sample_substring_anywhere() {
        let f = extract("Inception.2010.sample.mkv");
        assert!(f.excluded);
        assert_eq!(f.exclusion_keyword.as_deref(), Some("sample"));
    }

    #[test]
    fn main_feature_is_not_excluded() {
        let f = extract("Inception (2010).mkv");
        assert!(!f.excluded);
    }

    #[test]
    fn resolution_and_codec_tokens() {
        let f = extract("Inception.2010.1080p.x264-GROUP.mkv");
        assert_eq!(f.resolution.as_deref(), Some("1080P"));
        assert_eq!(f.codec.as_deref(), Some("X264"));
    }
}
