//! Health check endpoint
//!
//! Reports uptime, readiness of the dataset and model, and the last startup
//! error if any.

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok" once reviews and model are ready, "degraded" after a startup
    /// failure, "starting" otherwise
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub reviews_loaded: usize,
    pub model_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let reviews_loaded = state.reviews.len().await;
    let model_ready = state.classifier.is_ready().await;
    let last_error = state.last_error.read().await.clone();

    let status = if reviews_loaded > 0 && model_ready {
        "ok"
    } else if last_error.is_some() {
        "degraded"
    } else {
        "starting"
    };

    Json(HealthResponse {
        status: status.to_string(),
        module: crate::MODULE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        reviews_loaded,
        model_ready,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
