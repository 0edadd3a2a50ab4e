//! Clip pipeline configuration.

use std::path::PathBuf;

use crate::error::{ClipError, ClipResult};

/// Default admission gate capacity.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 2;
/// Default directory for transcoded clips.
pub const DEFAULT_WORK_DIR: &str = "/tmp/yt_clipper";

/// Clip pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipConfig {
    /// Maximum concurrent transcodes (admission gate capacity)
    pub max_concurrent_tasks: usize,
    /// Directory finished clips are written to and served from
    pub work_dir: PathBuf,
    /// yt-dlp binary name or path
    pub ytdlp_bin: String,
    /// FFmpeg binary name or path
    pub ffmpeg_bin: String,
    /// Optional Netscape cookies file for yt-dlp
    pub cookies_file: Option<PathBuf>,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
            work_dir: PathBuf::from(DEFAULT_WORK_DIR),
            ytdlp_bin: "yt-dlp".to_string(),
            ffmpeg_bin: "ffmpeg".to_string(),
            cookies_file: None,
        }
    }
}

impl ClipConfig {
    /// Create config from environment variables.
    ///
    /// An unparsable or zero `MAX_CONCURRENT_TASKS` is an error; the server
    /// refuses to start rather than run with a guessed capacity.
    pub fn from_env() -> ClipResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClipResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            max_concurrent_tasks: parse_capacity(lookup("MAX_CONCURRENT_TASKS").as_deref())?,
            work_dir: lookup("CLIP_WORK_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            ytdlp_bin: lookup("YTDLP_BIN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.ytdlp_bin),
            ffmpeg_bin: lookup("FFMPEG_BIN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.ffmpeg_bin),
            cookies_file: lookup("YTDLP_COOKIES_FILE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

/// Parse the gate capacity; unset means the default.
pub fn parse_capacity(raw: Option<&str>) -> ClipResult<usize> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MAX_CONCURRENT_TASKS);
    };

    match raw.trim().parse::<usize>() {
        Ok(0) => Err(ClipError::config_error(
            "MAX_CONCURRENT_TASKS must be at least 1",
        )),
        Ok(n) => Ok(n),
        Err(_) => Err(ClipError::config_error(format!(
            "MAX_CONCURRENT_TASKS must be a positive integer, got '{}'",
            raw
        ))),
    }
}
