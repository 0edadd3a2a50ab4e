//! Clip transcoding with a single fallback attempt.
//!
//! The first attempt encodes with the primary [`EncodingConfig`]; if it fails
//! the clip is encoded once more with the fallback config. Both attempts write
//! to a `.part` staging file which is only renamed to the final path on
//! success, so a failed or in-flight encode never appears under the final
//! name.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use ytclip_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegInput, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Suffix appended to the output file name while encoding.
pub const STAGING_SUFFIX: &str = ".part";

/// Inputs and output of one clip encode.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeRequest {
    pub video_url: Option<String>,
    pub audio_url: Option<String>,
    pub start_secs: u64,
    pub duration_secs: u64,
    pub output: PathBuf,
}

impl TranscodeRequest {
    fn with_output(&self, output: PathBuf) -> Self {
        Self {
            output,
            ..self.clone()
        }
    }
}

/// Runs one encode attempt.
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, request: &TranscodeRequest, encoding: &EncodingConfig) -> MediaResult<()>;
}

/// [`Transcoder`] backed by the FFmpeg CLI.
#[derive(Debug, Clone, Default)]
pub struct FfmpegTranscoder {
    runner: FfmpegRunner,
}

impl FfmpegTranscoder {
    pub fn new(runner: FfmpegRunner) -> Self {
        Self { runner }
    }

    /// Build the FFmpeg command for a request.
    ///
    /// Every input is trimmed on the input side so only the requested window
    /// is fetched from the remote URL.
    pub fn build_command(
        request: &TranscodeRequest,
        encoding: &EncodingConfig,
    ) -> MediaResult<FfmpegCommand> {
        let start = request.start_secs as f64;
        let duration = request.duration_secs as f64;
        let trimmed = |url: &str| FfmpegInput::new(url).seek(start).duration(duration);

        let cmd = FfmpegCommand::new(&request.output);
        let cmd = match (&request.video_url, &request.audio_url) {
            (Some(video), Some(audio)) => cmd
                .input(trimmed(video))
                .input(trimmed(audio))
                .map("0:v:0")
                .map("1:a:0"),
            // Keep the video stream's own audio track if it has one
            (Some(video), None) => cmd.input(trimmed(video)).map("0:v:0").map("0:a:0?"),
            (None, Some(audio)) => cmd.input(trimmed(audio)).map("0:a:0"),
            (None, None) => {
                return Err(MediaError::no_stream("transcode request has no input stream"))
            }
        };

        Ok(cmd.output_args(encoding.to_ffmpeg_args(request.video_url.is_some())))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, request: &TranscodeRequest, encoding: &EncodingConfig) -> MediaResult<()> {
        let cmd = Self::build_command(request, encoding)?;
        self.runner.run(&cmd).await
    }
}

/// Result of a successful encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeOutcome {
    /// 1 when the primary attempt succeeded, 2 after the fallback
    pub attempts: u32,
    /// Preset of the successful attempt
    pub preset: String,
}

/// Drives a [`Transcoder`] through the primary attempt and the single retry.
#[derive(Clone)]
pub struct TranscodeInvoker {
    transcoder: Arc<dyn Transcoder>,
    primary: EncodingConfig,
    fallback: EncodingConfig,
}

impl TranscodeInvoker {
    /// Invoker with the default primary and fallback encodings.
    pub fn new(transcoder: Arc<dyn Transcoder>) -> Self {
        Self {
            transcoder,
            primary: EncodingConfig::default(),
            fallback: EncodingConfig::fallback(),
        }
    }

    /// Encode `request.output`, retrying once with the fallback encoding.
    ///
    /// On error nothing is left at `request.output` or its staging path. The
    /// same holds if this future is dropped mid-encode: the FFmpeg child is
    /// killed and the staging file removed.
    pub async fn run(&self, request: &TranscodeRequest) -> MediaResult<TranscodeOutcome> {
        let staging = staging_path(&request.output);
        let staged = request.with_output(staging.clone());
        let _guard = StagingGuard {
            path: staging.clone(),
        };

        let first_error = match self.attempt(&staged, &self.primary).await {
            Ok(()) => return self.finalize(&staging, &request.output, 1, &self.primary).await,
            Err(e) => e,
        };

        warn!(
            output = %request.output.display(),
            preset = %self.primary.preset,
            error = %describe(&first_error),
            "Transcode failed, retrying with fallback preset {}",
            self.fallback.preset
        );

        match self.attempt(&staged, &self.fallback).await {
            Ok(()) => self.finalize(&staging, &request.output, 2, &self.fallback).await,
            Err(e) => Err(MediaError::TranscodeFailed {
                attempts: 2,
                message: describe(&e),
            }),
        }
    }

    /// One encode into the staging file; the staging file is removed on error.
    async fn attempt(&self, staged: &TranscodeRequest, encoding: &EncodingConfig) -> MediaResult<()> {
        let result = self.transcoder.transcode(staged, encoding).await;
        if result.is_err() {
            remove_if_exists(&staged.output).await;
        }
        result
    }

    async fn finalize(
        &self,
        staging: &Path,
        output: &Path,
        attempts: u32,
        encoding: &EncodingConfig,
    ) -> MediaResult<TranscodeOutcome> {
        if let Err(e) = tokio::fs::rename(staging, output).await {
            remove_if_exists(staging).await;
            return Err(MediaError::TranscodeFailed {
                attempts,
                message: format!("encoded file could not be moved into place: {}", e),
            });
        }

        info!(
            output = %output.display(),
            attempts,
            preset = %encoding.preset,
            "Transcode complete"
        );

        Ok(TranscodeOutcome {
            attempts,
            preset: encoding.preset.clone(),
        })
    }
}

/// `<output>.part` next to the output file.
pub fn staging_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

fn describe(error: &MediaError) -> String {
    match error.stderr_tail() {
        Some(tail) => format!("{} ({})", error, tail),
        None => error.to_string(),
    }
}

/// Removes the staging file when dropped. After a successful rename there is
/// nothing left to remove.
struct StagingGuard {
    path: PathBuf,
}

impl Drop for StagingGuard {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "Removed staging file of interrupted encode"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), "Failed to remove staging file: {}", e),
        }
    }
}

async fn remove_if_exists(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), "Failed to remove partial output: {}", e),
    }
}
