//! Filesystem-level facts and disc-structure/legacy-dir detection.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum DiscStructure {
    None,
    Bdmv,
    VideoTs,
}

impl DiscStructure {
    /// Short-name root for disc-structure image slots.
    pub fn root_dir(&self) -> Option<&'static str> {
        match self {
            DiscStructure::Bdmv => Some("BDMV"),
            DiscStructure::VideoTs => Some("VIDEO_TS"),
            DiscStructure::None => None,
        }
    }
}

pub fn detect_disc_structure(dir: &Path) -> DiscStructure {
    if dir.join("BDMV").join("index.bdmv").is_file() {
        DiscStructure::Bdmv
    } else if dir.join("VIDEO_TS").join("VIDEO_TS.IFO").is_file() {
        DiscStructure::VideoTs
    } else {
        DiscStructure::None
    }
}

pub const LEGACY_DIRS: &[&str] = &["extrafanarts", "extrathumbs"];

#[derive(Debug, Clone)]
pub struct LegacyDirInfo {
    pub name: String,
    pub files: Vec<PathBuf>,
}

pub fn scan_legacy_dirs(dir: &Path) -> std::io::Result<Vec<LegacyDirInfo>> {
    let mut out = Vec::new();
    for name in LEGACY_DIRS {
        let sub = dir.join(name);
        if sub.is_dir() {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&sub)? {
                let entry = entry?;
                if entry.file_type()?.is_file() {
                    files.push(entry.path());
                }
            }
            out.push(LegacyDirInfo { name: name.to_string(), files });
        }
    }
    Ok(out)
}

#[derive(Debug, Clone)]
pub struct FilesystemFacts {
    pub absolute_path: PathBuf,
    pub basename: String,
    pub extension: String,
    pub size_bytes: u64,
    pub parent_dir: PathBuf,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

pub fn probe(path: &Path) -> std::io::Result<FilesystemFacts> {
    let metadata = std::fs::metadata(path)?;
    Ok(FilesystemFacts {
        absolute_path: path.to_path_buf(),
        basename: path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase(),
        size_bytes: metadata.len(),
        parent_dir: path.parent().map(|p| p.to_path_buf()).unwrap_or_default(),
        modified: metadata.modified().ok(),
        created: metadata.created().ok(),
    })
}

/// Default ignore patterns: files the walker skips outright.
pub mod ignore {
    use once_cell::sync::Lazy;

    pub const EXACT: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", "@eaDir"];

    static GLOBS: Lazy<Vec<glob_lite::Pattern>> = Lazy::new(|| {
        [
            "*.tmp", "*.!ut", "*.crdownload", "*.part", "*.sample.*", "*-sample.*",
            "*.proof.*", "*-proof.*", "RARBG*", "*ETRG*", "*.torrent", "*.nzb",
        ]
        .iter()
        .map(|p| glob_lite::Pattern::new(p))
        .collect()
    });

    pub fn is_ignored(filename: &str) -> bool {
        EXACT.contains(&filename) || GLOBS.iter().any(|p| p.matches(filename))
    }

    /// A tiny `*`/`?` glob matcher.
    pub mod glob_lite {
        pub struct Pattern {
            regex: regex::Regex,
        }

        impl Pattern {
            pub fn new(glob: &str) -> Self {
                let mut re = String::from("(?i)^");
                for c in glob.chars() {
                    match c {
                        '*' => re.push_str(".*"),
                        '?' => re.push('.'),
                        c if "\\.+()|[]{}^$".contains(c) => {
                            re.push('\\');
                            re.push(c);
                        }
                        c => re.push(c),
                    }
                }
                re.push('$');
                Self { regex: regex::Regex::new(&re).unwrap() }
            }

            pub fn matches(&self, s: &str) -> bool {
                self.regex.is_match(s)
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn matches_exact_and_glob() {
            assert!(is_ignored("Thumbs.db"));
            assert!(is_ignored("download.crdownload"));
            assert!(is_ignored("movie.torrent"));
            assert!(!is_ignored("Inception (2010).mkv"));
        }
    }
}
