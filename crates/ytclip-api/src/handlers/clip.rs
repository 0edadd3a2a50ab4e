//! Clip creation handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use ytclip_models::ClipRequest;

use crate::error::{ApiError, ApiResult};
use crate::form::ClipForm;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ClipResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub download_url: String,
    pub title: String,
    /// Clip length in seconds
    pub duration: u64,
    /// `WxH`, or `Unknown` for audio-only clips
    pub resolution: String,
    pub hosted_remotely: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// `POST /api/clip`: cut, transcode and publish one clip.
///
/// The request is held open until the clip is published. The job runs on its
/// own task, so a client that disconnects does not cut the transcode short.
pub async fn create_clip(
    State(state): State<AppState>,
    ClipForm(request): ClipForm<ClipRequest>,
) -> ApiResult<Json<ClipResponse>> {
    let outcome = state
        .pipeline
        .spawn(request)
        .await
        .map_err(|e| ApiError::internal(format!("clip task failed: {}", e)))??;

    // The local copy of an uploaded clip is removed in the background
    drop(outcome.cleanup);

    Ok(Json(ClipResponse {
        status: "success",
        message: "Clip created successfully.",
        download_url: outcome.publish.download_url,
        title: outcome.title,
        duration: outcome.duration_secs,
        resolution: outcome.resolution,
        hosted_remotely: outcome.publish.hosted_remotely,
        warning: outcome.publish.warning,
    }))
}
