//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Default FFmpeg binary name.
pub const FFMPEG_BIN: &str = "ffmpeg";
/// Default yt-dlp binary name.
pub const YTDLP_BIN: &str = "yt-dlp";

/// One `-i` input with its own input-side arguments.
#[derive(Debug, Clone)]
pub struct FfmpegInput {
    /// Input arguments (before -i)
    args: Vec<String>,
    /// Path or URL
    source: String,
}

impl FfmpegInput {
    /// Create an input from a path or URL.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            args: Vec::new(),
            source: source.into(),
        }
    }

    /// Add an input argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Set seek position.
    pub fn seek(self, seconds: f64) -> Self {
        self.arg("-ss").arg(format!("{:.3}", seconds))
    }

    /// Set duration read from this input.
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.3}", seconds))
    }
}

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs in `-i` order
    inputs: Vec<FfmpegInput>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after the last -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Append an input.
    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Map a stream specifier into the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    pub fn inputs(&self) -> &[FfmpegInput] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    binary: String,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a runner using `ffmpeg` from PATH.
    pub fn new() -> Self {
        Self {
            binary: FFMPEG_BIN.to_string(),
        }
    }

    /// Use a specific FFmpeg binary.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Run an FFmpeg command to completion.
    ///
    /// The process is killed if the returned future is dropped before it exits.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_binary(&self.binary)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: {} {}", self.binary, args.join(" "));

        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            debug!("FFmpeg stderr: {}", stderr);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Resolve a binary name or path, failing if it is not executable.
pub fn check_binary(binary: &str) -> MediaResult<PathBuf> {
    which::which(binary).map_err(|_| MediaError::BinaryNotFound(binary.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("output.mp4")
            .input(FfmpegInput::new("https://cdn/v").seek(10.0).duration(30.0))
            .input(FfmpegInput::new("https://cdn/a").seek(10.0).duration(30.0))
            .map("0:v:0")
            .map("1:a:0")
            .output_args(["-c:v", "libx264"]);

        let args = cmd.build_args();
        assert_eq!(&args[..3], &["-y", "-v", "error"]);
        assert_eq!(
            &args[3..9],
            &["-ss", "10.000", "-t", "30.000", "-i", "https://cdn/v"]
        );
        assert_eq!(
            &args[9..15],
            &["-ss", "10.000", "-t", "30.000", "-i", "https://cdn/a"]
        );
        assert!(args.windows(2).any(|w| w == ["-map", "1:a:0"]));
        assert_eq!(args.last().map(String::as_str), Some("output.mp4"));
    }

    #[test]
    fn test_stderr_tail() {
        let err = MediaError::ffmpeg_failed(
            "failed",
            Some("frame=1\nServer returned 403 Forbidden\n\n".to_string()),
            Some(1),
        );
        assert_eq!(err.stderr_tail(), Some("Server returned 403 Forbidden"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dropped_run_kills_process() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("finished");
        let script = dir.path().join("slow-ffmpeg");
        std::fs::write(
            &script,
            format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = FfmpegRunner::new().with_binary(script.to_string_lossy());
        let cmd = FfmpegCommand::new(dir.path().join("out.mp4"));
        let result = tokio::time::timeout(Duration::from_millis(200), runner.run(&cmd)).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[test]
    fn test_missing_binary() {
        let err = check_binary("ytclip-definitely-not-a-binary").unwrap_err();
        assert!(matches!(err, MediaError::BinaryNotFound(_)));
    }
}
