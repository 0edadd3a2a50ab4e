//! Source video and stream descriptor models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Streams shorter than this are not offered as a quality.
pub const MIN_LISTED_HEIGHT: u32 = 144;

/// One downloadable stream of a source video, as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StreamDescriptor {
    /// Extractor format identifier
    pub id: String,
    /// Frame height in pixels
    #[serde(default)]
    pub height: Option<u32>,
    /// Frame width in pixels
    #[serde(default)]
    pub width: Option<u32>,
    /// Bitrate in kbit/s
    #[serde(default)]
    pub bitrate: Option<f64>,
    /// Stream carries audio
    pub has_audio: bool,
    /// Stream carries video
    pub has_video: bool,
    /// Container extension (mp4, webm, m4a, ...)
    #[serde(default)]
    pub ext: Option<String>,
    /// Direct media URL
    pub url: String,
}

impl StreamDescriptor {
    /// Audio present, video absent.
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }

    /// Bitrate with unknown treated as zero.
    pub fn bitrate_or_zero(&self) -> f64 {
        self.bitrate.unwrap_or(0.0)
    }

    /// Height with unknown treated as zero.
    pub fn height_or_zero(&self) -> u32 {
        self.height.unwrap_or(0)
    }

    /// `WxH` when both dimensions are known.
    pub fn resolution(&self) -> Option<String> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
            _ => None,
        }
    }
}

/// Metadata for a source video.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SourceInfo {
    pub title: String,
    /// Total duration in seconds
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub streams: Vec<StreamDescriptor>,
}

/// A quality the user can pick for a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QualityOption {
    pub value: String,
    pub label: String,
}

/// Build the list of selectable qualities for a set of streams.
///
/// Unique heights of at least [`MIN_LISTED_HEIGHT`], tallest first, followed
/// by the audio-only option.
pub fn quality_options(streams: &[StreamDescriptor]) -> Vec<QualityOption> {
    let mut heights: Vec<u32> = streams
        .iter()
        .filter_map(|s| s.height)
        .filter(|h| *h >= MIN_LISTED_HEIGHT)
        .collect();
    heights.sort_unstable_by(|a, b| b.cmp(a));
    heights.dedup();

    let mut options: Vec<QualityOption> = heights
        .into_iter()
        .map(|h| QualityOption {
            value: h.to_string(),
            label: height_label(h),
        })
        .collect();

    options.push(QualityOption {
        value: "audio".to_string(),
        label: "Audio only (M4A)".to_string(),
    });

    options
}

fn height_label(height: u32) -> String {
    let suffix = if height >= 2160 {
        " (4K)"
    } else if height >= 1440 {
        " (2K)"
    } else if height == 1080 {
        " (HD)"
    } else {
        ""
    };
    format!("{}p{}", height, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(id: &str, height: Option<u32>) -> StreamDescriptor {
        StreamDescriptor {
            id: id.to_string(),
            height,
            width: None,
            bitrate: None,
            has_audio: false,
            has_video: true,
            ext: Some("mp4".to_string()),
            url: format!("https://cdn.example/{}", id),
        }
    }

    #[test]
    fn test_quality_options_sorted_and_deduplicated() {
        let streams = vec![
            video("a", Some(720)),
            video("b", Some(2160)),
            video("c", Some(720)),
            video("d", Some(1080)),
            video("e", Some(1440)),
            video("f", Some(90)),
            video("g", None),
        ];

        let values: Vec<String> = quality_options(&streams).into_iter().map(|o| o.value).collect();
        assert_eq!(values, vec!["2160", "1440", "1080", "720", "audio"]);
    }

    #[test]
    fn test_quality_labels() {
        let streams = vec![video("a", Some(2160)), video("b", Some(1440)), video("c", Some(1080)), video("d", Some(480))];
        let labels: Vec<String> = quality_options(&streams).into_iter().map(|o| o.label).collect();
        assert_eq!(labels[0], "2160p (4K)");
        assert_eq!(labels[1], "1440p (2K)");
        assert_eq!(labels[2], "1080p (HD)");
        assert_eq!(labels[3], "480p");
    }

    #[test]
    fn test_quality_options_always_offer_audio() {
        let options = quality_options(&[]);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, "audio");
    }

    #[test]
    fn test_descriptor_helpers() {
        let mut d = video("a", Some(720));
        assert!(!d.is_audio_only());
        assert_eq!(d.bitrate_or_zero(), 0.0);
        assert_eq!(d.resolution(), None);
        d.width = Some(1280);
        assert_eq!(d.resolution().as_deref(), Some("1280x720"));
    }
}
