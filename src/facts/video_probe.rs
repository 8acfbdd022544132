//! Video/audio stream facts via an external probe.
//!
//! Grounded in the teacher's `ffmpeg.rs` (ffprobe subprocess + JSON decode).
//! The probe itself is behind a trait so the fact gatherer's tests inject a
//! fake rather than spawning a real subprocess.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "m4v", "ts", "mov", "wmv"];

#[derive(Debug, Clone, PartialEq)]
pub struct VideoStreamFacts {
    pub codec: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub bitrate: Option<i64>,
    pub profile: Option<String>,
    pub color_space: Option<String>,
    pub hdr_format: Option<HdrFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HdrFormat {
    Hdr10,
    Hlg,
    Hdr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioStreamFacts {
    pub codec: String,
    pub channels: u32,
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStreamFacts {
    pub codec: String,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoFacts {
    pub duration_secs: f64,
    pub video_streams: Vec<VideoStreamFacts>,
    pub audio_streams: Vec<AudioStreamFacts>,
    pub subtitle_streams: Vec<SubtitleStreamFacts>,
}

impl VideoFacts {
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }
}

/// Infers the HDR family from the transfer-function tag.
pub fn infer_hdr(transfer: &str, color_space: &str) -> Option<HdrFormat> {
    match transfer {
        "smpte2084" | "pq" => Some(HdrFormat::Hdr10),
        "arib-std-b67" | "hlg" => Some(HdrFormat::Hlg),
        _ if color_space.eq_ignore_ascii_case("bt2020") => Some(HdrFormat::Hdr),
        _ => None,
    }
}

#[async_trait]
pub trait VideoProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> anyhow::Result<VideoFacts>;
}

/// `ffprobe`-backed implementation, invoked as a subprocess exactly the way
/// the teacher's `FfmpegService` does.
pub struct FfprobeVideoProbe {
    pub ffprobe_path: String,
}

impl Default for FfprobeVideoProbe {
    fn default() -> Self {
        Self { ffprobe_path: "ffprobe".to_string() }
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    #[serde(default)]
    r_frame_rate: Option<String>,
    bit_rate: Option<String>,
    profile: Option<String>,
    color_space: Option<String>,
    color_transfer: Option<String>,
    channels: Option<u32>,
    #[serde(default)]
    tags: Option<std::collections::HashMap<String, String>>,
}

#[async_trait]
impl VideoProbe for FfprobeVideoProbe {
    async fn probe(&self, path: &Path) -> anyhow::Result<VideoFacts> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v", "quiet",
                "-print_format", "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            anyhow::bail!("ffprobe exited with {}", output.status);
        }

        let parsed: FfprobeOutput = serde_json::from_slice(&output.stdout)?;
        Ok(convert(parsed))
    }
}

fn convert(parsed: FfprobeOutput) -> VideoFacts {
    let duration_secs = parsed
        .format
        .duration
        .and_then(|d| d.parse().ok())
        .unwrap_or(0.0);

    let mut facts = VideoFacts { duration_secs, ..Default::default() };

    for s in parsed.streams {
        match s.codec_type.as_str() {
            "video" => {
                let fps = s
                    .r_frame_rate
                    .as_deref()
                    .and_then(parse_frame_rate)
                    .unwrap_or(0.0);
                let hdr = match (&s.color_transfer, &s.color_space) {
                    (Some(t), Some(c)) => infer_hdr(t, c),
                    (Some(t), None) => infer_hdr(t, ""),
                    _ => None,
                };
                facts.video_streams.push(VideoStreamFacts {
                    codec: s.codec_name.unwrap_or_default(),
                    width: s.width.unwrap_or(0),
                    height: s.height.unwrap_or(0),
                    fps,
                    bitrate: s.bit_rate.and_then(|b| b.parse().ok()),
                    profile: s.profile,
                    color_space: s.color_space,
                    hdr_format: hdr,
                });
            }
            "audio" => {
                facts.audio_streams.push(AudioStreamFacts {
                    codec: s.codec_name.unwrap_or_default(),
                    channels: s.channels.unwrap_or(0),
                    language: s.tags.as_ref().and_then(|t| t.get("language").cloned()),
                });
            }
            "subtitle" => {
                facts.subtitle_streams.push(SubtitleStreamFacts {
                    codec: s.codec_name.unwrap_or_default(),
                    language: s.tags.as_ref().and_then(|t| t.get("language").cloned()),
                });
            }
            _ => {}
        }
    }

    facts
}

fn parse_frame_rate(s: &str) -> Option<f64> {
    let mut parts = s.split('/');
    let num: f64 = parts.next()?.parse().ok()?;
    let den: f64 = parts.next().unwrap_or("1").parse().ok()?;
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_hdr10_from_smpte2084() {
        assert_eq!(infer_hdr("smpte2084", "bt2020"), Some(HdrFormat::Hdr10));
    }

    #[test]
    fn infers_hlg() {
        assert_eq!(infer_hdr("arib-std-b67", "bt2020"), Some(HdrFormat::Hlg));
    }

    #[test]
    fn falls_back_to_plain_hdr_for_bt2020() {
        assert_eq!(infer_hdr("bt709", "bt2020"), Some(HdrFormat::Hdr));
    }

    #[test]
    fn non_hdr_transfer_is_none() {
        assert_eq!(infer_hdr("bt709", "bt709"), None);
    }

    #[test]
    fn parses_fractional_frame_rate() {
        assert_eq!(parse_frame_rate("24000/1001"), Some(24000.0 / 1001.0));
    }
}
