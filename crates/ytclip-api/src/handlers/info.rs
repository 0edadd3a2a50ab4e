//! Source metadata handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use ytclip_models::{quality_options, QualityOption};

use crate::error::ApiResult;
use crate::form::ClipForm;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InfoForm {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub status: &'static str,
    pub title: String,
    /// Seconds, 0 when unknown
    pub duration: f64,
    /// Empty when unknown
    pub thumbnail: String,
    pub qualities: Vec<QualityOption>,
}

/// `POST /api/info`: title, duration, thumbnail and selectable qualities.
pub async fn video_info(
    State(state): State<AppState>,
    ClipForm(form): ClipForm<InfoForm>,
) -> ApiResult<Json<InfoResponse>> {
    let url = form.url.trim();
    let source = state.pipeline.fetch_info(url).await.map_err(|e| {
        error!(url, "Error fetching info: {}", e);
        e
    })?;

    let qualities = quality_options(&source.streams);
    info!(url, title = %source.title, qualities = qualities.len(), "Fetched video info");

    Ok(Json(InfoResponse {
        status: "success",
        title: source.title,
        duration: source.duration.unwrap_or(0.0),
        thumbnail: source.thumbnail.unwrap_or_default(),
        qualities,
    }))
}
