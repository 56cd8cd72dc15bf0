//! Startup tasks
//!
//! Dataset loading and model initialization run as two independent
//! background tasks. Neither blocks the other or the HTTP server; the
//! workflow checks readiness instead. Failures show on the error banner and
//! are not retried.

use crate::classifier::{ModelState, SentimentClassifier};
use crate::reviews::{DatasetSource, LoadState};
use crate::AppState;
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub const REVIEWS_FAILED_MESSAGE: &str = "Failed to load reviews";
pub const MODEL_FAILED_MESSAGE: &str = "Failed to load sentiment model";

/// Pre-populate the token input from the settings table
pub async fn restore_saved_token(state: &AppState) {
    match state.credentials.load_saved().await {
        Ok(Some(token)) => {
            state.view.set_token_input(&token);
            info!("Restored saved access token");
        }
        Ok(None) => info!("No saved access token; hosted inference rejects anonymous requests"),
        Err(e) => warn!("Could not read saved access token: {}", e),
    }
}

pub async fn load_reviews(state: &AppState, source: &DatasetSource, client: &Client) {
    info!("Loading reviews from {}", source);

    match state.reviews.load(source, client).await {
        Ok(count) => {
            info!(count, "Reviews loaded");
            if count == 0 {
                warn!("Dataset {} contains no usable reviews", source);
            }
        }
        Err(e) => {
            error!("Failed to load reviews from {}: {}", source, e);
            state.view.show_error(REVIEWS_FAILED_MESSAGE);
            state.record_error(e.to_string()).await;
        }
    }

    refresh_status(state).await;
}

pub async fn init_classifier(state: &AppState, classifier: Arc<dyn SentimentClassifier>) {
    let model = classifier.model_id().to_string();
    info!("Loading sentiment model {}", model);

    match state.classifier.initialize(classifier).await {
        Ok(()) => info!("✓ Sentiment model {} ready", model),
        Err(e) => {
            error!("Failed to load sentiment model {}: {}", model, e);
            state.view.show_error(MODEL_FAILED_MESSAGE);
            state.record_error(e.to_string()).await;
        }
    }

    refresh_status(state).await;
}

/// Human-readable readiness line for the status indicator
pub async fn status_text(state: &AppState) -> String {
    let reviews = match state.reviews.state().await {
        LoadState::Pending => "loading".to_string(),
        LoadState::Loaded => format!("{} loaded", state.reviews.len().await),
        LoadState::Failed => "failed".to_string(),
    };

    let model = match state.classifier.state().await {
        ModelState::Loading => "loading",
        ModelState::Ready => "ready",
        ModelState::Failed => "failed",
    };

    format!("Reviews: {} | Model: {}", reviews, model)
}

pub async fn refresh_status(state: &AppState) {
    let status = status_text(state).await;
    state.view.set_status(&status);
}

/// Start dataset loading and model initialization concurrently
pub fn spawn_background_init(
    state: AppState,
    source: DatasetSource,
    client: Client,
    classifier: Arc<dyn SentimentClassifier>,
) -> (JoinHandle<()>, JoinHandle<()>) {
    let reviews_state = state.clone();
    let reviews_task = tokio::spawn(async move {
        load_reviews(&reviews_state, &source, &client).await;
    });

    let model_task = tokio::spawn(async move {
        init_classifier(&state, classifier).await;
    });

    (reviews_task, model_task)
}
