//! Clip request and job identifier models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::Quality;

/// Extension of every transcoded clip.
pub const CLIP_EXTENSION: &str = "mp4";

/// Unique identifier for a clip job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipJobId(pub String);

impl ClipJobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Output file name for this job (`<id>.mp4`).
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CLIP_EXTENSION)
    }
}

impl Default for ClipJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to cut one clip from a source video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Validate)]
pub struct ClipRequest {
    /// Source video page URL, passed to the extractor as given
    pub url: String,
    /// Start time (`SS`, `MM:SS` or `H:MM:SS`)
    #[validate(length(min = 1, max = 32))]
    pub start_time: String,
    /// End time (`SS`, `MM:SS` or `H:MM:SS`)
    #[validate(length(min = 1, max = 32))]
    pub end_time: String,
    /// Raw quality selector: `best`, `audio` or a height
    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_quality() -> String {
    "best".to_string()
}

impl ClipRequest {
    pub fn new(
        url: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            start_time: start_time.into(),
            end_time: end_time.into(),
            quality: quality.into(),
        }
    }

    /// Parsed quality selector.
    pub fn quality(&self) -> Quality {
        Quality::parse_lenient(&self.quality)
    }
}
