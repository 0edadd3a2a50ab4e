//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

use crate::handlers::{create_clip, download_clip, health, ready, video_info};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/info", post(video_info))
        .route("/clip", post(create_clip));

    let download_routes = Router::new().route("/download/:file", get(download_clip));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    let mut router = Router::new()
        .nest("/api", api_routes)
        .merge(download_routes)
        .merge(health_routes)
        .merge(metrics_routes);

    // Frontend: index.html at `/`, its assets under `/static`
    if let Some(dir) = &state.config.static_dir {
        if dir.is_dir() {
            info!("Serving frontend from {}", dir.display());
            router = router
                .route_service("/", ServeFile::new(dir.join("index.html")))
                .nest_service("/static", ServeDir::new(dir));
        } else {
            warn!("Static directory {} not found, frontend disabled", dir.display());
        }
    }

    router
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_logging))
        // Outside request_logging so the ID is already set when it logs
        .layer(middleware::from_fn(request_id))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
