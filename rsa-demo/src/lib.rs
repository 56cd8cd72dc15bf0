//! rsa-demo library - Review Sentiment demo service
//!
//! Picks a random product review, classifies its sentiment with a pretrained
//! model, shows the result in a small web page and logs the interaction to a
//! remote collector.

pub mod api;
pub mod classifier;
pub mod credentials;
pub mod error;
pub mod reviews;
pub mod sentiment;
pub mod startup;
pub mod telemetry;
pub mod view;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use classifier::ClassifierHandle;
use credentials::CredentialStore;
use reviews::ReviewStore;
use sqlx::SqlitePool;
use std::sync::Arc;
use telemetry::TelemetryEmitter;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use view::ViewModel;

/// Module name used in health output and config file lookup
pub const MODULE_NAME: &str = "rsa-demo";

/// Application state shared across handlers and background tasks
#[derive(Clone)]
pub struct AppState {
    /// Settings database (access token)
    pub db: SqlitePool,
    /// Reviews loaded at startup
    pub reviews: ReviewStore,
    /// Optional access token
    pub credentials: CredentialStore,
    /// Classifier, usable once initialized
    pub classifier: ClassifierHandle,
    /// Interaction logging
    pub telemetry: TelemetryEmitter,
    /// Presentation state mirrored to the browser
    pub view: ViewModel,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last startup error, for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(db: SqlitePool, telemetry: TelemetryEmitter) -> Self {
        Self {
            credentials: CredentialStore::new(db.clone()),
            db,
            reviews: ReviewStore::new(),
            classifier: ClassifierHandle::new(),
            telemetry,
            view: ViewModel::default(),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the review store (tests, preloaded datasets)
    pub fn with_reviews(mut self, reviews: ReviewStore) -> Self {
        self.reviews = reviews;
        self
    }

    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // UI routes (page + static assets)
        .merge(api::ui_routes())
        // API routes
        .merge(api::analyze_routes())
        .merge(api::token_routes())
        .merge(api::view_routes())
        .merge(api::buildinfo_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
