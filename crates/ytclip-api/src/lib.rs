//! Axum HTTP API server for clip extraction.
//!
//! This crate provides:
//! - `/api/info` and `/api/clip` form endpoints
//! - Local clip downloads
//! - Health, readiness and Prometheus metrics endpoints

pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
