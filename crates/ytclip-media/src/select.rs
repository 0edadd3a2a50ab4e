//! Stream selection by requested quality.
//!
//! Rules:
//! - audio: the audio-only stream with the highest bitrate
//! - `Height(h)`: exact height match with the highest bitrate, otherwise the
//!   video stream whose height is closest to `h`
//! - `Best`: the first video stream in extractor order
//!
//! Ties always resolve to the stream that came first.

use tracing::info;
use ytclip_models::{Quality, StreamDescriptor};

use crate::error::{MediaError, MediaResult};

/// Streams chosen for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSelection {
    /// `None` for audio-only clips
    pub video: Option<StreamDescriptor>,
    /// `None` when the source has no audio-only stream
    pub audio: Option<StreamDescriptor>,
}

impl StreamSelection {
    /// `WxH` of the selected video stream.
    pub fn resolution(&self) -> Option<String> {
        self.video.as_ref().and_then(StreamDescriptor::resolution)
    }
}

/// Pick the video and audio streams for a quality.
pub fn select_streams(
    streams: &[StreamDescriptor],
    quality: Quality,
) -> MediaResult<StreamSelection> {
    let audio = best_audio(streams).cloned();

    if quality.is_audio() {
        if audio.is_none() {
            return Err(MediaError::no_stream("source has no audio-only stream"));
        }
        return Ok(StreamSelection { video: None, audio });
    }

    let video_streams: Vec<&StreamDescriptor> = streams.iter().filter(|s| s.has_video).collect();

    let video = match quality {
        Quality::Height(target) => pick_by_height(&video_streams, target),
        // Extractor order, not sorted by quality
        _ => video_streams.first().copied(),
    }
    .cloned()
    .ok_or_else(|| MediaError::no_stream("could not retrieve a video stream"))?;

    info!(
        format_id = %video.id,
        resolution = %video.resolution().unwrap_or_else(|| "unknown".to_string()),
        ext = %video.ext.as_deref().unwrap_or("unknown"),
        "Selected video stream"
    );

    Ok(StreamSelection {
        video: Some(video),
        audio,
    })
}

/// Highest-bitrate audio-only stream.
fn best_audio(streams: &[StreamDescriptor]) -> Option<&StreamDescriptor> {
    first_max_by_bitrate(streams.iter().filter(|s| s.is_audio_only()))
}

fn pick_by_height<'a>(
    video_streams: &[&'a StreamDescriptor],
    target: u32,
) -> Option<&'a StreamDescriptor> {
    let exact = first_max_by_bitrate(
        video_streams
            .iter()
            .copied()
            .filter(|s| s.height == Some(target)),
    );

    // min_by_key keeps the first of equal minima
    exact.or_else(|| {
        video_streams
            .iter()
            .copied()
            .min_by_key(|s| s.height_or_zero().abs_diff(target))
    })
}

/// `Iterator::max_by` keeps the last of equal maxima, we want the first.
fn first_max_by_bitrate<'a>(
    iter: impl Iterator<Item = &'a StreamDescriptor>,
) -> Option<&'a StreamDescriptor> {
    iter.fold(None, |best: Option<&'a StreamDescriptor>, s| match best {
        Some(b) if s.bitrate_or_zero() <= b.bitrate_or_zero() => Some(b),
        _ => Some(s),
    })
}
