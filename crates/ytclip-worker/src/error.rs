//! Clip job error types.

use thiserror::Error;
use ytclip_media::MediaError;
use ytclip_models::TimestampError;

pub type ClipResult<T> = Result<T, ClipError>;

/// Reasons a clip job can fail.
///
/// Every variant renders as a single human-readable message; `category()`
/// gives the machine-readable kind.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("Invalid time format: {0}")]
    InvalidTimeFormat(String),

    #[error("End time must be greater than start time.")]
    InvalidDuration { start_secs: u64, end_secs: u64 },

    #[error("Could not fetch video info: {0}")]
    ExtractionError(String),

    #[error("Could not retrieve video stream: {0}")]
    NoStreamAvailable(String),

    #[error("Failed to process video clip: {0}")]
    TranscodeFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipError {
    pub fn extraction(msg: impl Into<String>) -> Self {
        Self::ExtractionError(msg.into())
    }

    pub fn transcode_failed(msg: impl Into<String>) -> Self {
        Self::TranscodeFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Machine-readable error kind, used as the API error code and metric label.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidTimeFormat(_) => "invalid_time_format",
            Self::InvalidDuration { .. } => "invalid_duration",
            Self::ExtractionError(_) => "extraction_error",
            Self::NoStreamAvailable(_) => "no_stream_available",
            Self::TranscodeFailed(_) => "transcode_failed",
            Self::ConfigError(_) => "config_error",
            Self::Internal(_) | Self::Io(_) => "internal",
        }
    }

    /// Whether the failure is attributable to the request rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidTimeFormat(_)
                | Self::InvalidDuration { .. }
                | Self::ExtractionError(_)
                | Self::NoStreamAvailable(_)
        )
    }
}

impl From<TimestampError> for ClipError {
    fn from(err: TimestampError) -> Self {
        match err {
            TimestampError::NonPositiveDuration {
                start_secs,
                end_secs,
            } => Self::InvalidDuration {
                start_secs,
                end_secs,
            },
            TimestampError::InvalidFormat(input) => Self::InvalidTimeFormat(input),
        }
    }
}

impl From<MediaError> for ClipError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::ExtractionFailed { message } => Self::ExtractionError(message),
            MediaError::NoStreamAvailable(message) => Self::NoStreamAvailable(message),
            MediaError::TranscodeFailed { .. } | MediaError::FfmpegFailed { .. } => {
                Self::TranscodeFailed(err.to_string())
            }
            MediaError::BinaryNotFound(binary) => {
                Self::Internal(format!("{} is not installed", binary))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
