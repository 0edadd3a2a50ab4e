//! Clip encoding configuration.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Preset for the first encode attempt
pub const DEFAULT_PRESET: &str = "superfast";
/// Preset for the single retry after a failed attempt
pub const FALLBACK_PRESET: &str = "ultrafast";
/// Default CRF (Constant Rate Factor)
pub const DEFAULT_CRF: u8 = 23;
/// Output container
pub const OUTPUT_FORMAT: &str = "mp4";

/// Video encoding configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "superfast", "ultrafast")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Constant Rate Factor (quality, 0-51, lower is better)
    #[serde(default = "default_crf")]
    pub crf: u8,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Move the moov atom to the front so playback starts before the
    /// download completes
    #[serde(default = "default_faststart")]
    pub faststart: bool,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_crf() -> u8 {
    DEFAULT_CRF
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_faststart() -> bool {
    true
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: DEFAULT_VIDEO_CODEC.to_string(),
            preset: DEFAULT_PRESET.to_string(),
            crf: DEFAULT_CRF,
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            faststart: true,
        }
    }
}

impl EncodingConfig {
    /// Create a new encoding configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration used for the retry after a failed attempt.
    pub fn fallback() -> Self {
        Self {
            preset: FALLBACK_PRESET.to_string(),
            ..Default::default()
        }
    }

    /// Convert to FFmpeg output arguments.
    ///
    /// Video codec arguments are omitted for audio-only output.
    pub fn to_ffmpeg_args(&self, with_video: bool) -> Vec<String> {
        let mut args = Vec::new();

        if with_video {
            args.extend_from_slice(&[
                "-c:v".to_string(),
                self.codec.clone(),
                "-preset".to_string(),
                self.preset.clone(),
                "-crf".to_string(),
                self.crf.to_string(),
            ]);
        } else {
            args.push("-vn".to_string());
        }

        args.extend_from_slice(&[
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-strict".to_string(),
            "experimental".to_string(),
        ]);

        if self.faststart {
            args.extend_from_slice(&["-movflags".to_string(), "+faststart".to_string()]);
        }

        args.extend_from_slice(&["-f".to_string(), OUTPUT_FORMAT.to_string()]);

        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.preset, "superfast");
        assert_eq!(config.crf, 23);
        assert!(config.faststart);
    }

    #[test]
    fn test_fallback_only_changes_preset() {
        let fallback = EncodingConfig::fallback();
        assert_eq!(fallback.preset, "ultrafast");
        let primary = EncodingConfig {
            preset: DEFAULT_PRESET.to_string(),
            ..fallback
        };
        assert_eq!(primary, EncodingConfig::default());
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = EncodingConfig::default().to_ffmpeg_args(true);
        assert!(args.windows(2).any(|w| w == ["-c:v", "libx264"]));
        assert!(args.windows(2).any(|w| w == ["-preset", "superfast"]));
        assert!(args.windows(2).any(|w| w == ["-crf", "23"]));
        assert!(args.windows(2).any(|w| w == ["-c:a", "aac"]));
        assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
        assert!(args.windows(2).any(|w| w == ["-f", "mp4"]));
    }

    #[test]
    fn test_audio_only_args_skip_video_codec() {
        let args = EncodingConfig::default().to_ffmpeg_args(false);
        assert!(args.contains(&"-vn".to_string()));
        assert!(!args.contains(&"-c:v".to_string()));
        assert!(!args.contains(&"-crf".to_string()));
    }
}
