//! Health check handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use ytclip_media::check_binary;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
    pub gate: GateStatus,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub ytdlp: CheckStatus,
    pub ffmpeg: CheckStatus,
    /// "remote" when uploads are enabled, "local" otherwise
    pub storage: String,
}

#[derive(Serialize)]
pub struct GateStatus {
    pub capacity: usize,
    pub in_use: usize,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CheckStatus {
    fn binary(name: &str) -> Self {
        match check_binary(name) {
            Ok(path) => Self {
                status: "ok".to_string(),
                path: Some(path.display().to_string()),
                error: None,
            },
            Err(e) => Self {
                status: "error".to_string(),
                path: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
/// Checks that yt-dlp and FFmpeg are installed and reports gate usage.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let ytdlp = CheckStatus::binary(&state.clip_config.ytdlp_bin);
    let ffmpeg = CheckStatus::binary(&state.clip_config.ffmpeg_bin);
    let all_ok = ytdlp.is_ok() && ffmpeg.is_ok();

    let gate = state.pipeline.gate();
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            ytdlp,
            ffmpeg,
            storage: if state.pipeline.publisher().has_remote_store() {
                "remote"
            } else {
                "local"
            }
            .to_string(),
        },
        gate: GateStatus {
            capacity: gate.capacity(),
            in_use: gate.in_use(),
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
