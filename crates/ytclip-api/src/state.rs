//! Application state.

use std::sync::Arc;

use tracing::{info, warn};
use ytclip_media::{FfmpegRunner, FfmpegTranscoder, TranscodeInvoker, YtDlpExtractor};
use ytclip_storage::{ObjectStore, S3Store};
use ytclip_worker::{AdmissionGate, ClipConfig, ClipPipeline, Publisher};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub clip_config: ClipConfig,
    pub pipeline: Arc<ClipPipeline>,
}

impl AppState {
    /// Create new application state with the production collaborators.
    ///
    /// Object storage is optional: when it is not configured clips are served
    /// from the local download route.
    pub async fn new(config: ApiConfig, clip_config: ClipConfig) -> ApiResult<Self> {
        tokio::fs::create_dir_all(&clip_config.work_dir)
            .await
            .map_err(|e| {
                ApiError::internal(format!(
                    "cannot create work dir {}: {}",
                    clip_config.work_dir.display(),
                    e
                ))
            })?;

        let mut extractor = YtDlpExtractor::new().with_binary(&clip_config.ytdlp_bin);
        if let Some(cookies) = &clip_config.cookies_file {
            extractor = extractor.with_cookies(cookies);
        }

        let transcoder =
            FfmpegTranscoder::new(FfmpegRunner::new().with_binary(&clip_config.ffmpeg_bin));

        let store: Option<Arc<dyn ObjectStore>> = match S3Store::from_env() {
            Ok(store) => {
                info!(bucket = %store.bucket(), "Object storage enabled");
                Some(Arc::new(store))
            }
            Err(e) => {
                warn!("Object storage disabled, clips served locally: {}", e);
                None
            }
        };

        let gate = AdmissionGate::new(clip_config.max_concurrent_tasks)?;
        info!(capacity = gate.capacity(), "Admission gate ready");

        let pipeline = ClipPipeline::new(
            Arc::new(extractor),
            TranscodeInvoker::new(Arc::new(transcoder)),
            gate,
            Publisher::new(store),
            clip_config.work_dir.clone(),
        );

        Ok(Self::from_parts(config, clip_config, pipeline))
    }

    /// Assemble state from an already built pipeline.
    pub fn from_parts(config: ApiConfig, clip_config: ClipConfig, pipeline: ClipPipeline) -> Self {
        Self {
            config,
            clip_config,
            pipeline: Arc::new(pipeline),
        }
    }
}
