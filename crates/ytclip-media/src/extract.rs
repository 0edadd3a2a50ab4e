//! Source metadata extraction using yt-dlp.
//!
//! `yt-dlp -J` prints one JSON document describing the video, including every
//! available format with a direct media URL. Nothing is downloaded here; the
//! direct URLs are handed to FFmpeg which reads only the requested window.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use ytclip_models::{SourceInfo, StreamDescriptor};

use crate::command::{check_binary, YTDLP_BIN};
use crate::error::{MediaError, MediaResult};

/// Title used when the extractor reports none.
const UNTITLED: &str = "Untitled video";

/// Resolves a source URL into metadata and stream descriptors.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> MediaResult<SourceInfo>;
}

/// [`MediaExtractor`] backed by the yt-dlp CLI.
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary: String,
    cookies_path: Option<PathBuf>,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpExtractor {
    pub fn new() -> Self {
        Self {
            binary: YTDLP_BIN.to_string(),
            cookies_path: None,
        }
    }

    /// Use a specific yt-dlp binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Pass a Netscape cookies file to yt-dlp.
    pub fn with_cookies(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookies_path = Some(path.into());
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn build_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "-J".to_string(),
            "--no-warnings".to_string(),
            "--no-playlist".to_string(),
        ];

        if let Some(cookies) = &self.cookies_path {
            if cookies.exists() {
                args.push("--cookies".to_string());
                args.push(cookies.to_string_lossy().to_string());
            } else {
                warn!(path = %cookies.display(), "Cookies file not found, skipping");
            }
        }

        // End of options: a URL starting with '-' must not be read as a flag
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn extract(&self, url: &str) -> MediaResult<SourceInfo> {
        check_binary(&self.binary)?;

        info!(url = %url, "Fetching source metadata with yt-dlp");

        let output = Command::new(&self.binary)
            .args(self.build_args(url))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            let error_msg = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .unwrap_or("Unknown error");
            return Err(MediaError::extraction_failed(format!(
                "yt-dlp failed: {}",
                error_msg
            )));
        }

        let info = parse_ytdlp_json(&output.stdout)?;
        info!(
            title = %info.title,
            streams = info.streams.len(),
            "Fetched source metadata"
        );
        Ok(info)
    }
}

/// yt-dlp `-J` output (only the fields we use).
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: Option<String>,
    url: Option<String>,
    ext: Option<String>,
    height: Option<u32>,
    width: Option<u32>,
    acodec: Option<String>,
    vcodec: Option<String>,
    /// Total bitrate, kbit/s
    tbr: Option<f64>,
    /// Audio bitrate, kbit/s
    abr: Option<f64>,
}

impl YtDlpFormat {
    /// Formats without a direct URL cannot be fed to FFmpeg.
    fn into_descriptor(self) -> Option<StreamDescriptor> {
        let url = self.url?;
        // yt-dlp writes "none" for an absent codec; a missing field means unknown
        let has_audio = self.acodec.as_deref() != Some("none");
        let has_video = self.vcodec.as_deref() != Some("none");
        let bitrate = if has_audio && !has_video {
            self.abr
        } else {
            self.tbr
        };

        Some(StreamDescriptor {
            id: self.format_id.unwrap_or_default(),
            height: self.height,
            width: self.width,
            bitrate,
            has_audio,
            has_video,
            ext: self.ext,
            url,
        })
    }
}

/// Parse yt-dlp `-J` output into [`SourceInfo`], keeping format order.
pub fn parse_ytdlp_json(bytes: &[u8]) -> MediaResult<SourceInfo> {
    let raw: YtDlpInfo = serde_json::from_slice(bytes)
        .map_err(|e| MediaError::extraction_failed(format!("invalid yt-dlp output: {}", e)))?;

    Ok(SourceInfo {
        title: raw.title.unwrap_or_else(|| UNTITLED.to_string()),
        duration: raw.duration,
        thumbnail: raw.thumbnail,
        streams: raw
            .formats
            .into_iter()
            .filter_map(YtDlpFormat::into_descriptor)
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc123def45",
        "title": "Sample video",
        "duration": 212.0,
        "thumbnail": "https://i.ytimg.com/vi/abc123def45/maxresdefault.jpg",
        "formats": [
            {"format_id": "sb0", "url": "https://cdn/sb0", "ext": "mhtml", "acodec": "none", "vcodec": "none"},
            {"format_id": "140", "url": "https://cdn/140", "ext": "m4a", "acodec": "mp4a.40.2", "vcodec": "none", "abr": 129.5, "tbr": 129.5},
            {"format_id": "251", "url": "https://cdn/251", "ext": "webm", "acodec": "opus", "vcodec": "none", "abr": 135.1},
            {"format_id": "136", "url": "https://cdn/136", "ext": "mp4", "acodec": "none", "vcodec": "avc1.4d401f", "height": 720, "width": 1280, "tbr": 1500.2},
            {"format_id": "18", "url": "https://cdn/18", "ext": "mp4", "acodec": "mp4a.40.2", "vcodec": "avc1.42001E", "height": 360, "width": 640, "tbr": 500.0},
            {"format_id": "hls-1", "ext": "mp4", "height": 1080}
        ]
    }"#;

    #[test]
    fn test_parse_metadata() {
        let info = parse_ytdlp_json(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.title, "Sample video");
        assert_eq!(info.duration, Some(212.0));
        assert!(info.thumbnail.unwrap().contains("abc123def45"));
        // the URL-less format is dropped
        assert_eq!(info.streams.len(), 5);
    }

    #[test]
    fn test_codec_presence_rules() {
        let info = parse_ytdlp_json(SAMPLE.as_bytes()).unwrap();
        let by_id = |id: &str| info.streams.iter().find(|s| s.id == id).unwrap().clone();

        let storyboard = by_id("sb0");
        assert!(!storyboard.has_audio && !storyboard.has_video);

        let audio = by_id("140");
        assert!(audio.is_audio_only());
        assert_eq!(audio.bitrate, Some(129.5));

        let video = by_id("136");
        assert!(video.has_video && !video.has_audio);
        assert_eq!(video.bitrate, Some(1500.2));
        assert_eq!(video.resolution().as_deref(), Some("1280x720"));

        let muxed = by_id("18");
        assert!(muxed.has_video && muxed.has_audio);
    }

    #[test]
    fn test_audio_bitrate_uses_abr() {
        let info = parse_ytdlp_json(SAMPLE.as_bytes()).unwrap();
        let opus = info.streams.iter().find(|s| s.id == "251").unwrap();
        assert_eq!(opus.bitrate, Some(135.1));
    }

    #[test]
    fn test_missing_codec_fields_count_as_present() {
        let json = r#"{"title": "t", "formats": [{"format_id": "x", "url": "https://cdn/x"}]}"#;
        let info = parse_ytdlp_json(json.as_bytes()).unwrap();
        assert!(info.streams[0].has_audio);
        assert!(info.streams[0].has_video);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let info = parse_ytdlp_json(br#"{}"#).unwrap();
        assert_eq!(info.title, UNTITLED);
        assert!(info.duration.is_none());
        assert!(info.streams.is_empty());
    }

    #[test]
    fn test_invalid_json_is_extraction_error() {
        let err = parse_ytdlp_json(b"ERROR: not json").unwrap_err();
        assert!(matches!(err, MediaError::ExtractionFailed { .. }));
    }

    #[test]
    fn test_build_args_terminates_options() {
        let args = YtDlpExtractor::new().build_args("https://youtu.be/abc");
        assert_eq!(args[0], "-J");
        assert_eq!(&args[args.len() - 2..], &["--", "https://youtu.be/abc"]);
        assert!(!args.contains(&"--cookies".to_string()));
    }
}
