//! Clip time parsing and validation.
//!
//! Times are whole seconds written as `SS`, `MM:SS` or `H:MM:SS`. Fields are
//! not range checked, so `1:75` is 135 seconds.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parse a clip time string to whole seconds.
///
/// # Examples
/// ```
/// use ytclip_models::timestamp::parse_clip_time;
/// assert_eq!(parse_clip_time("1:30:00").unwrap(), 5400);
/// assert_eq!(parse_clip_time("05:30").unwrap(), 330);
/// assert_eq!(parse_clip_time("90").unwrap(), 90);
/// ```
pub fn parse_clip_time(ts: &str) -> Result<u64, TimestampError> {
    let trimmed = ts.trim();
    if trimmed.is_empty() {
        return Err(TimestampError::invalid_format(ts));
    }

    let fields = trimmed
        .split(':')
        .map(|field| parse_field(field).ok_or_else(|| TimestampError::invalid_format(ts)))
        .collect::<Result<Vec<u64>, _>>()?;

    let total = match fields.as_slice() {
        [secs] => Some(*secs),
        [mins, secs] => mins.checked_mul(60).and_then(|m| m.checked_add(*secs)),
        [hours, mins, secs] => hours
            .checked_mul(3600)
            .and_then(|h| mins.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(*secs)),
        _ => None,
    };

    total.ok_or_else(|| TimestampError::invalid_format(ts))
}

/// Digits only; `u64::from_str` would also accept a leading `+`.
fn parse_field(field: &str) -> Option<u64> {
    let field = field.trim();
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Format seconds as `HH:MM:SS`.
pub fn format_seconds(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

/// A validated clip window with a strictly positive duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClipWindow {
    /// Start offset in seconds
    pub start_secs: u64,
    /// End offset in seconds
    pub end_secs: u64,
}

impl ClipWindow {
    /// Parse and validate a start/end pair.
    pub fn parse(start: &str, end: &str) -> Result<Self, TimestampError> {
        let start_secs = parse_clip_time(start)?;
        let end_secs = parse_clip_time(end)?;
        Self::new(start_secs, end_secs)
    }

    /// Build a window from already parsed offsets.
    pub fn new(start_secs: u64, end_secs: u64) -> Result<Self, TimestampError> {
        if end_secs <= start_secs {
            return Err(TimestampError::NonPositiveDuration {
                start_secs,
                end_secs,
            });
        }
        Ok(Self {
            start_secs,
            end_secs,
        })
    }

    /// Clip duration in seconds, always > 0.
    pub fn duration_secs(&self) -> u64 {
        self.end_secs - self.start_secs
    }
}

/// Timestamp parsing/validation error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Invalid time format '{0}'. Use SS, MM:SS or H:MM:SS")]
    InvalidFormat(String),

    #[error("End time ({end_secs}s) must be greater than start time ({start_secs}s)")]
    NonPositiveDuration { start_secs: u64, end_secs: u64 },
}

impl TimestampError {
    pub fn invalid_format(ts: impl Into<String>) -> Self {
        Self::InvalidFormat(ts.into())
    }
}
