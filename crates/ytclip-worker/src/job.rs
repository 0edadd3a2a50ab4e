//! Clip job orchestration.
//!
//! A job moves through
//! `Created -> Validated -> MetadataFetched -> StreamsSelected -> Transcoding -> Published`
//! or ends in `Failed` from any non-terminal state. States are never
//! re-entered and there is no job-level retry; the only retry is the
//! fallback encode inside [`TranscodeInvoker`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::Instrument;
use validator::Validate;
use ytclip_media::{
    select_streams, MediaError, MediaExtractor, StreamSelection, TranscodeInvoker,
    TranscodeRequest,
};
use ytclip_models::timestamp::format_seconds;
use ytclip_models::{ClipJobId, ClipRequest, ClipWindow, SourceInfo};

use crate::error::{ClipError, ClipResult};
use crate::gate::AdmissionGate;
use crate::logging::JobLogger;
use crate::metrics;
use crate::publisher::{PublishResult, Publisher};

/// Resolution reported when no video stream was selected.
pub const UNKNOWN_RESOLUTION: &str = "Unknown";

/// Lifecycle state of a clip job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "reason")]
pub enum ClipJobState {
    Created,
    Validated,
    MetadataFetched,
    StreamsSelected,
    Transcoding,
    Published,
    /// Failure category
    Failed(String),
}

impl ClipJobState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::MetadataFetched => "metadata_fetched",
            Self::StreamsSelected => "streams_selected",
            Self::Transcoding => "transcoding",
            Self::Published => "published",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Published | Self::Failed(_))
    }

    /// The single forward successor, or `Failed` from any non-terminal state.
    pub fn can_transition_to(&self, next: &ClipJobState) -> bool {
        use ClipJobState::*;
        match (self, next) {
            (from, Failed(_)) => !from.is_terminal(),
            (Created, Validated)
            | (Validated, MetadataFetched)
            | (MetadataFetched, StreamsSelected)
            | (StreamsSelected, Transcoding)
            | (Transcoding, Published) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ClipJobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(reason) => write!(f, "failed({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// One clip request in flight.
#[derive(Debug)]
pub struct ClipJob {
    pub id: ClipJobId,
    pub state: ClipJobState,
    pub window: Option<ClipWindow>,
    pub selection: Option<StreamSelection>,
    pub output: PathBuf,
    logger: JobLogger,
}

impl ClipJob {
    pub fn new(id: ClipJobId, work_dir: &Path) -> Self {
        let output = work_dir.join(id.file_name());
        let logger = JobLogger::new(&id, "clip");
        Self {
            id,
            state: ClipJobState::Created,
            window: None,
            selection: None,
            output,
            logger,
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: ClipJobState) -> ClipResult<()> {
        if !self.state.can_transition_to(&next) {
            return Err(ClipError::internal(format!(
                "invalid job transition {} -> {}",
                self.state, next
            )));
        }
        self.logger.log_transition(self.state.name(), next.name());
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, error: &ClipError) {
        self.logger.log_error(error.category(), &error.to_string());
        if !self.state.is_terminal() {
            self.state = ClipJobState::Failed(error.category().to_string());
        }
    }

    pub fn logger(&self) -> &JobLogger {
        &self.logger
    }
}

/// A successfully published clip.
#[derive(Debug)]
pub struct ClipOutcome {
    pub job_id: ClipJobId,
    pub publish: PublishResult,
    pub title: String,
    pub duration_secs: u64,
    /// `WxH` of the selected video stream or [`UNKNOWN_RESOLUTION`]
    pub resolution: String,
    /// Background removal of the local file after an upload
    pub cleanup: Option<JoinHandle<()>>,
}

/// Extraction, selection, transcoding and publishing for clip requests.
#[derive(Clone)]
pub struct ClipPipeline {
    extractor: Arc<dyn MediaExtractor>,
    invoker: TranscodeInvoker,
    gate: AdmissionGate,
    publisher: Publisher,
    work_dir: PathBuf,
}

impl ClipPipeline {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        invoker: TranscodeInvoker,
        gate: AdmissionGate,
        publisher: Publisher,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            extractor,
            invoker,
            gate,
            publisher,
            work_dir: work_dir.into(),
        }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Source metadata without running a job.
    ///
    /// The URL goes to the extractor untouched; a blank one is an extraction
    /// error without calling it.
    pub async fn fetch_info(&self, url: &str) -> ClipResult<SourceInfo> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ClipError::extraction("url is required"));
        }
        self.extractor.extract(url).await.map_err(extraction_error)
    }

    /// Run a job on its own task.
    ///
    /// Dropping the handle detaches the job; it still runs to completion and
    /// holds its gate slot until the transcode finishes.
    pub fn spawn(self: &Arc<Self>, request: ClipRequest) -> JoinHandle<ClipResult<ClipOutcome>> {
        let pipeline = Arc::clone(self);
        tokio::spawn(async move { pipeline.run(request).await })
    }

    /// Run one clip job to completion.
    pub async fn run(&self, request: ClipRequest) -> ClipResult<ClipOutcome> {
        let mut job = ClipJob::new(ClipJobId::new(), &self.work_dir);
        job.logger().log_start(&format!(
            "{} [{} - {}] quality={}",
            request.url, request.start_time, request.end_time, request.quality
        ));

        let span = job.logger().span();
        match self.drive(&mut job, &request).instrument(span).await {
            Ok(outcome) => {
                metrics::record_job_completed(outcome.publish.hosted_remotely);
                job.logger().log_completion(&outcome.publish.download_url);
                Ok(outcome)
            }
            Err(e) => {
                metrics::record_job_failed(e.category());
                job.fail(&e);
                Err(e)
            }
        }
    }

    async fn drive(&self, job: &mut ClipJob, request: &ClipRequest) -> ClipResult<ClipOutcome> {
        // Created -> Validated: nothing external runs before this passes
        request
            .validate()
            .map_err(|e| ClipError::InvalidTimeFormat(e.to_string()))?;
        let window = ClipWindow::parse(&request.start_time, &request.end_time)?;
        job.window = Some(window);
        job.advance(ClipJobState::Validated)?;
        job.logger().log_progress(&format!(
            "window {} - {} ({}s)",
            format_seconds(window.start_secs),
            format_seconds(window.end_secs),
            window.duration_secs()
        ));

        let info = self.fetch_info(&request.url).await?;
        job.advance(ClipJobState::MetadataFetched)?;

        let selection = select_streams(&info.streams, request.quality())?;
        let resolution = selection
            .resolution()
            .unwrap_or_else(|| UNKNOWN_RESOLUTION.to_string());
        let transcode_request = TranscodeRequest {
            video_url: selection.video.as_ref().map(|s| s.url.clone()),
            audio_url: selection.audio.as_ref().map(|s| s.url.clone()),
            start_secs: window.start_secs,
            duration_secs: window.duration_secs(),
            output: job.output.clone(),
        };
        job.selection = Some(selection);
        job.advance(ClipJobState::StreamsSelected)?;

        {
            let _permit = self.gate.acquire(job.id.as_str()).await?;
            job.advance(ClipJobState::Transcoding)?;

            let started = Instant::now();
            let result = self.invoker.run(&transcode_request).await;
            let elapsed = started.elapsed().as_secs_f64();

            match &result {
                Ok(outcome) => metrics::record_transcode(elapsed, outcome.attempts, true),
                Err(MediaError::TranscodeFailed { attempts, .. }) => {
                    metrics::record_transcode(elapsed, *attempts, false)
                }
                Err(_) => metrics::record_transcode(elapsed, 1, false),
            }

            let outcome = result?;
            job.logger().log_progress(&format!(
                "encoded in {:.1}s ({} attempt(s), preset {})",
                elapsed, outcome.attempts, outcome.preset
            ));
        }

        let published = self.publisher.publish(&job.output, &job.id).await;
        if let Some(warning) = &published.result.warning {
            job.logger().log_warning(warning);
        }
        job.advance(ClipJobState::Published)?;

        Ok(ClipOutcome {
            job_id: job.id.clone(),
            publish: published.result,
            title: info.title,
            duration_secs: window.duration_secs(),
            resolution,
            cleanup: published.cleanup,
        })
    }
}

/// Every extractor failure is an extraction error, whatever its cause.
fn extraction_error(err: MediaError) -> ClipError {
    match err {
        MediaError::ExtractionFailed { message } => ClipError::extraction(message),
        other => ClipError::extraction(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use ytclip_media::{MediaResult, Transcoder};
    use ytclip_models::{EncodingConfig, StreamDescriptor};

    struct FakeExtractor {
        calls: AtomicUsize,
        result: Result<SourceInfo, String>,
    }

    impl FakeExtractor {
        fn ok(streams: Vec<StreamDescriptor>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Ok(SourceInfo {
                    title: "Sample".to_string(),
                    duration: Some(300.0),
                    thumbnail: None,
                    streams,
                }),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                result: Err(message.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MediaExtractor for FakeExtractor {
        async fn extract(&self, _url: &str) -> MediaResult<SourceInfo> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(MediaError::extraction_failed)
        }
    }

    struct FakeTranscoder {
        failures: usize,
        requests: Mutex<Vec<TranscodeRequest>>,
    }

    impl FakeTranscoder {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures,
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transcoder for FakeTranscoder {
        async fn transcode(
            &self,
            request: &TranscodeRequest,
            _encoding: &EncodingConfig,
        ) -> MediaResult<()> {
            let call = {
                let mut requests = self.requests.lock().unwrap();
                requests.push(request.clone());
                requests.len()
            };
            if call <= self.failures {
                tokio::fs::write(&request.output, b"partial").await?;
                return Err(MediaError::ffmpeg_failed("exit 1", None, Some(1)));
            }
            tokio::fs::write(&request.output, b"clip").await?;
            Ok(())
        }
    }

    /// Holds the encode open until released.
    #[derive(Default)]
    struct HeldTranscoder {
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl Transcoder for HeldTranscoder {
        async fn transcode(
            &self,
            request: &TranscodeRequest,
            _encoding: &EncodingConfig,
        ) -> MediaResult<()> {
            tokio::fs::write(&request.output, b"partial").await?;
            self.release.notified().await;
            tokio::fs::write(&request.output, b"clip").await?;
            Ok(())
        }
    }

    fn streams() -> Vec<StreamDescriptor> {
        vec![
            StreamDescriptor {
                id: "140".to_string(),
                height: None,
                width: None,
                bitrate: Some(128.0),
                has_audio: true,
                has_video: false,
                ext: Some("m4a".to_string()),
                url: "https://cdn/140".to_string(),
            },
            StreamDescriptor {
                id: "136".to_string(),
                height: Some(720),
                width: Some(1280),
                bitrate: Some(1500.0),
                has_audio: false,
                has_video: true,
                ext: Some("mp4".to_string()),
                url: "https://cdn/136".to_string(),
            },
        ]
    }

    fn pipeline(
        dir: &TempDir,
        extractor: Arc<FakeExtractor>,
        transcoder: Arc<FakeTranscoder>,
    ) -> ClipPipeline {
        ClipPipeline::new(
            extractor,
            TranscodeInvoker::new(transcoder),
            AdmissionGate::new(1).unwrap(),
            Publisher::local_only(),
            dir.path(),
        )
    }

    fn request(start: &str, end: &str, quality: &str) -> ClipRequest {
        ClipRequest::new("https://www.youtube.com/watch?v=abc123", start, end, quality)
    }

    #[test]
    fn test_state_transitions() {
        use ClipJobState::*;
        assert!(Created.can_transition_to(&Validated));
        assert!(Transcoding.can_transition_to(&Published));
        assert!(MetadataFetched.can_transition_to(&Failed("x".into())));
        assert!(!Created.can_transition_to(&Transcoding));
        assert!(!Published.can_transition_to(&Failed("x".into())));
        assert!(!Validated.can_transition_to(&Validated));
        assert!(!Failed("x".into()).can_transition_to(&Created));
    }

    #[test]
    fn test_job_rejects_skipped_state() {
        let dir = TempDir::new().unwrap();
        let mut job = ClipJob::new(ClipJobId::from_string("j"), dir.path());
        assert_eq!(job.output, dir.path().join("j.mp4"));
        assert!(job.advance(ClipJobState::Published).is_err());
        assert!(job.advance(ClipJobState::Validated).is_ok());
        assert_eq!(job.state, ClipJobState::Validated);
    }

    #[tokio::test]
    async fn test_non_positive_duration_makes_no_external_calls() {
        let dir = TempDir::new().unwrap();
        let extractor = FakeExtractor::ok(streams());
        let transcoder = FakeTranscoder::new(0);
        let pipeline = pipeline(&dir, extractor.clone(), transcoder.clone());

        for (start, end) in [("0:10", "0:05"), ("1:00", "60"), ("0", "0")] {
            let err = pipeline.run(request(start, end, "best")).await.unwrap_err();
            assert!(matches!(err, ClipError::InvalidDuration { .. }), "{start}-{end}");
        }
        assert_eq!(extractor.calls(), 0);
        assert_eq!(transcoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_time_is_rejected() {
        let dir = TempDir::new().unwrap();
        let extractor = FakeExtractor::ok(streams());
        let pipeline = pipeline(&dir, extractor.clone(), FakeTranscoder::new(0));

        let err = pipeline.run(request("1:2:3:4", "5:00", "best")).await.unwrap_err();
        assert_eq!(err.category(), "invalid_time_format");
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_retry_then_publish_locally() {
        let dir = TempDir::new().unwrap();
        let transcoder = FakeTranscoder::new(1);
        let pipeline = pipeline(&dir, FakeExtractor::ok(streams()), transcoder.clone());

        let outcome = pipeline.run(request("0:10", "0:40", "720")).await.unwrap();

        assert_eq!(transcoder.calls(), 2);
        assert_eq!(outcome.title, "Sample");
        assert_eq!(outcome.duration_secs, 30);
        assert_eq!(outcome.resolution, "1280x720");
        assert_eq!(
            outcome.publish.download_url,
            format!("/download/{}", outcome.job_id.file_name())
        );
        assert!(!outcome.publish.hosted_remotely);
        assert!(dir.path().join(outcome.job_id.file_name()).exists());
        assert_eq!(pipeline.gate().in_use(), 0);

        let sent = transcoder.requests.lock().unwrap()[0].clone();
        assert_eq!(sent.start_secs, 10);
        assert_eq!(sent.duration_secs, 30);
        assert_eq!(sent.video_url.as_deref(), Some("https://cdn/136"));
        assert_eq!(sent.audio_url.as_deref(), Some("https://cdn/140"));
    }

    #[tokio::test]
    async fn test_transcode_failure_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let transcoder = FakeTranscoder::new(2);
        let pipeline = pipeline(&dir, FakeExtractor::ok(streams()), transcoder.clone());

        let err = pipeline.run(request("0", "30", "best")).await.unwrap_err();

        assert_eq!(err.category(), "transcode_failed");
        assert_eq!(transcoder.calls(), 2);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(pipeline.gate().in_use(), 0);
    }

    #[tokio::test]
    async fn test_audio_quality_has_no_video() {
        let dir = TempDir::new().unwrap();
        let transcoder = FakeTranscoder::new(0);
        let pipeline = pipeline(&dir, FakeExtractor::ok(streams()), transcoder.clone());

        let outcome = pipeline.run(request("5", "10", "audio")).await.unwrap();
        assert_eq!(outcome.resolution, UNKNOWN_RESOLUTION);

        let sent = transcoder.requests.lock().unwrap()[0].clone();
        assert!(sent.video_url.is_none());
        assert_eq!(sent.audio_url.as_deref(), Some("https://cdn/140"));
    }

    #[tokio::test]
    async fn test_extraction_failure() {
        let dir = TempDir::new().unwrap();
        let transcoder = FakeTranscoder::new(0);
        let pipeline = pipeline(
            &dir,
            FakeExtractor::failing("Video unavailable"),
            transcoder.clone(),
        );

        let err = pipeline.run(request("0", "10", "best")).await.unwrap_err();
        assert_eq!(err.category(), "extraction_error");
        assert!(err.to_string().contains("Video unavailable"));
        assert_eq!(transcoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_video_stream() {
        let dir = TempDir::new().unwrap();
        let audio_only = streams().into_iter().filter(|s| !s.has_video).collect();
        let transcoder = FakeTranscoder::new(0);
        let pipeline = pipeline(&dir, FakeExtractor::ok(audio_only), transcoder.clone());

        let err = pipeline.run(request("0", "10", "1080")).await.unwrap_err();
        assert_eq!(err.category(), "no_stream_available");
        assert_eq!(transcoder.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_url_is_extraction_error() {
        let dir = TempDir::new().unwrap();
        let extractor = FakeExtractor::ok(streams());
        let pipeline = pipeline(&dir, extractor.clone(), FakeTranscoder::new(0));

        let req = ClipRequest::new("  ", "0", "10", "best");
        let err = pipeline.run(req).await.unwrap_err();
        assert_eq!(err.category(), "extraction_error");
        assert_eq!(extractor.calls(), 0);

        let err = pipeline.fetch_info("").await.unwrap_err();
        assert_eq!(err.category(), "extraction_error");
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_schemeless_url_reaches_extractor() {
        let dir = TempDir::new().unwrap();
        let extractor = FakeExtractor::ok(streams());
        let transcoder = FakeTranscoder::new(0);
        let pipeline = pipeline(&dir, extractor.clone(), transcoder.clone());

        let req = ClipRequest::new("www.youtube.com/watch?v=abc123", "0", "10", "best");
        pipeline.run(req).await.unwrap();
        assert_eq!(extractor.calls(), 1);
        assert_eq!(transcoder.calls(), 1);
    }

    #[tokio::test]
    async fn test_overlong_time_is_time_format_error() {
        let dir = TempDir::new().unwrap();
        let extractor = FakeExtractor::ok(streams());
        let pipeline = pipeline(&dir, extractor.clone(), FakeTranscoder::new(0));

        let start = "0".repeat(40);
        let err = pipeline.run(request(&start, "10", "best")).await.unwrap_err();
        assert_eq!(err.category(), "invalid_time_format");
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_spawned_job_outlives_dropped_caller() {
        let dir = TempDir::new().unwrap();
        let transcoder = Arc::new(HeldTranscoder::default());
        let pipeline = Arc::new(ClipPipeline::new(
            FakeExtractor::ok(streams()),
            TranscodeInvoker::new(transcoder.clone()),
            AdmissionGate::new(1).unwrap(),
            Publisher::local_only(),
            dir.path(),
        ));

        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            pipeline.spawn(request("0:10", "0:20", "720")),
        )
        .await;
        assert!(waited.is_err());

        // The caller is gone but the encode keeps its slot
        assert_eq!(pipeline.gate().in_use(), 1);
        assert_eq!(pipeline.gate().available(), 0);

        transcoder.release.notify_one();
        tokio::time::timeout(Duration::from_secs(5), async {
            while pipeline.gate().in_use() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(names[0].ends_with(".mp4"));
    }
}
