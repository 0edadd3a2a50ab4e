//! Local clip download handler.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::debug;
use ytclip_models::CLIP_EXTENSION;

use crate::error::{ApiError, ApiResult, FILE_NOT_FOUND};
use crate::state::AppState;

/// `GET /download/:file`: stream a finished clip as an attachment.
///
/// Only `<token>.mp4` names inside the work directory are served; anything
/// else, including in-progress `.part` files, is reported as not found.
pub async fn download_clip(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    if !is_clip_file_name(&file) {
        debug!(file = %file, "Rejected download name");
        return Err(ApiError::not_found(FILE_NOT_FOUND));
    }

    let path = state.pipeline.work_dir().join(&file);
    let handle = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(_) => return Err(ApiError::not_found(FILE_NOT_FOUND)),
    };
    let length = handle.metadata().await.ok().map(|m| m.len());

    let body = Body::from_stream(ReaderStream::new(handle));
    let disposition = format!("attachment; filename=\"{}\"", file);

    let mut response = (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response();

    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }

    Ok(response)
}

/// `<token>.mp4` where the token is ASCII alphanumerics, `-` or `_`.
pub fn is_clip_file_name(name: &str) -> bool {
    let Some(stem) = name
        .strip_suffix(CLIP_EXTENSION)
        .and_then(|s| s.strip_suffix('.'))
    else {
        return false;
    };

    !stem.is_empty()
        && stem
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
