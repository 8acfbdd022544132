//! Text-file fact extraction for NFO/subtitle detection.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TEXT_EXTENSIONS: &[&str] = &["nfo", "srt", "ass", "ssa", "vtt", "sub", "idx", "txt"];
const READ_LIMIT: usize = 10 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextFacts {
    pub tmdb_id: Option<i32>,
    pub imdb_id: Option<String>,
    pub is_nfo_xml: bool,
    pub is_subtitle: bool,
    pub subtitle_language: Option<String>,
}

static XML_TMDB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<uniqueid[^>]*type="tmdb"[^>]*>(\d+)</uniqueid>"#).unwrap());
static XML_IMDB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<uniqueid[^>]*type="imdb"[^>]*>(tt\d+)</uniqueid>"#).unwrap());
static LEGACY_TMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<tmdb>(\d+)</tmdb>").unwrap());
static LEGACY_IMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"<imdb>(tt\d+)</imdb>").unwrap());
static URL_TMDB: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"themoviedb\.org/movie/(\d+)").unwrap());
static URL_IMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"imdb\.com/title/(tt\d+)").unwrap());
static LOOSE_TMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)tmdb[/:=\s]+(\d+)").unwrap());
static LOOSE_IMDB: Lazy<Regex> = Lazy::new(|| Regex::new(r"(tt\d{7,})").unwrap());

static TIMESTAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d\d:\d\d:\d\d").unwrap());
static LANG_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.([a-z]{2,3})\.[a-z]+$").unwrap());

/// Reads up to `READ_LIMIT` bytes and extracts facts. I/O errors propagate;
/// callers treat a probe failure as "no text facts", per 
pub fn probe(path: &std::path::Path) -> std::io::Result<TextFacts> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; READ_LIMIT];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    let text = String::from_utf8_lossy(&buf);
    Ok(extract(&text, path))
}

pub fn extract(text: &str, path: &std::path::Path) -> TextFacts {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();

    let mut facts = TextFacts::default();

    if ext == "nfo" {
        facts.tmdb_id = find_id(text, &XML_TMDB).or_else(|| find_id(text, &LEGACY_TMDB)).or_else(|| {
            find_str(text, &URL_TMDB).and_then(|s| s.parse().ok())
        }).or_else(|| find_str(text, &LOOSE_TMDB).and_then(|s| s.parse().ok()));

        facts.imdb_id = find_str(text, &XML_IMDB)
            .or_else(|| find_str(text, &LEGACY_IMDB))
            .or_else(|| find_str(text, &URL_IMDB))
            .or_else(|| find_str(text, &LOOSE_IMDB));

        facts.is_nfo_xml = text.contains("<uniqueid") || facts.tmdb_id.is_some() || facts.imdb_id.is_some()
            || text.trim_start().starts_with("<?xml") || text.contains("<movie>");
    } else {
        let has_timestamp = TIMESTAMP.is_match(text) || text.contains("-->") || text.contains("Dialogue:");
        if has_timestamp {
            facts.is_subtitle = true;
            facts.subtitle_language = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| LANG_SUFFIX.captures(n))
                .map(|c| c[1].to_string());
        }
    }

    facts
}

fn find_id(text: &str, re: &Regex) -> Option<i32> {
    re.captures(text).and_then(|c| c.get(1)).and_then(|m| m.as_str().parse().ok())
}

fn find_str(text: &str, re: &Regex) -> Option<String> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn finds_xml_uniqueid_tmdb() {
        let xml = r#"<movie><uniqueid type="tmdb">27205</uniqueid></movie>"#;
        let facts = extract(xml, Path::new("Inception (2010).nfo"));
        assert_eq!(facts.tmdb_id, Some(27205));
        assert!(facts.is_nfo_xml);
    }

    #[test]
    fn finds_legacy_imdb_tag() {
        let xml = "<movie><imdb>tt1375666</imdb></movie>";
        let facts = extract(xml, Path::new("movie.nfo"));
        assert_eq!(facts.imdb_id.as_deref(), Some("tt1375666"));
    }

    #[test]
    fn finds_url_scraped_tmdb_id() {
        let text = "see https://www.themoviedb.org/movie/603-the-matrix for details";
        let facts = extract(text, Path::new("movie.nfo"));
        assert_eq!(facts.tmdb_id, Some(603));
    }

    #[test]
    fn detects_subtitle_via_arrow_marker() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nHello";
        let facts = extract(srt, Path::new("Inception (2010).en.srt"));
        assert!(facts.is_subtitle);
        assert_eq!(facts.subtitle_language.as_deref(), Some("en"));
    }

    #[test]
    fn plain_nfo_without_ids_is_not_xml() {
        let facts = extract("just some notes", Path::new("notes.nfo"));
        assert!(!facts.is_nfo_xml);
        assert!(facts.tmdb_id.is_none());
    }
}
