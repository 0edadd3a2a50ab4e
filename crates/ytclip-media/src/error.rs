//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during extraction, selection and transcoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("{0} not found in PATH")]
    BinaryNotFound(String),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Extraction failed: {message}")]
    ExtractionFailed { message: String },

    #[error("No suitable stream available: {0}")]
    NoStreamAvailable(String),

    #[error("Transcode failed after {attempts} attempts: {message}")]
    TranscodeFailed { attempts: u32, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an extraction failure error.
    pub fn extraction_failed(message: impl Into<String>) -> Self {
        Self::ExtractionFailed {
            message: message.into(),
        }
    }

    /// Create a no-stream error.
    pub fn no_stream(message: impl Into<String>) -> Self {
        Self::NoStreamAvailable(message.into())
    }

    /// Last non-empty stderr line, if the error carries one.
    pub fn stderr_tail(&self) -> Option<&str> {
        match self {
            Self::FfmpegFailed {
                stderr: Some(stderr),
                ..
            } => stderr.lines().rev().find(|l| !l.trim().is_empty()),
            _ => None,
        }
    }
}
