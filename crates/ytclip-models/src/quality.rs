//! Requested clip quality.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality selector for a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    /// First video stream the extractor reported
    #[default]
    Best,
    /// Audio only, no video stream
    Audio,
    /// Target frame height
    Height(u32),
}

impl Quality {
    /// Parse a user supplied selector. Never fails: anything that is not
    /// `audio` or a positive height falls back to [`Quality::Best`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Quality::Best)
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Quality::Audio)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Best => write!(f, "best"),
            Quality::Audio => write!(f, "audio"),
            Quality::Height(h) => write!(f, "{}", h),
        }
    }
}

impl FromStr for Quality {
    type Err = QualityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => return Ok(Quality::Audio),
            "best" => return Ok(Quality::Best),
            _ => {}
        }

        let digits = s.trim();
        let digits = digits.strip_prefix('+').unwrap_or(digits);
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            // Taller than any stream: still a target, the closest stream wins
            let height = digits.parse::<u32>().unwrap_or(u32::MAX);
            if height > 0 {
                return Ok(Quality::Height(height));
            }
        }
        Err(QualityParseError(s.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown quality: {0}")]
pub struct QualityParseError(String);
