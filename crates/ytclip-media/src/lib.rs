#![deny(unreachable_patterns)]
//! External media tooling for clip extraction.
//!
//! This crate provides:
//! - Source metadata extraction through `yt-dlp -J`
//! - Stream selection by requested quality
//! - Type-safe FFmpeg command building
//! - Clip transcoding with a single fallback attempt

pub mod command;
pub mod error;
pub mod extract;
pub mod select;
pub mod transcode;

pub use command::{check_binary, FfmpegCommand, FfmpegInput, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use extract::{parse_ytdlp_json, MediaExtractor, YtDlpExtractor};
pub use select::{select_streams, StreamSelection};
pub use transcode::{
    staging_path, FfmpegTranscoder, TranscodeInvoker, TranscodeOutcome, TranscodeRequest,
    Transcoder,
};
