//! View state endpoints
//!
//! `GET /api/view` returns the current snapshot. `GET /api/events` streams a
//! `ViewUpdated` event for every change, starting with the current state.

use crate::view::ViewSnapshot;
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Json, Router,
};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

fn snapshot_event(snapshot: &ViewSnapshot) -> Option<Event> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(Event::default().event("ViewUpdated").data(json)),
        Err(e) => {
            warn!("SSE: Failed to serialize view snapshot: {}", e);
            None
        }
    }
}

/// GET /api/view
pub async fn get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    Json(state.view.snapshot())
}

/// GET /api/events
pub async fn view_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to view events");

    // Subscribe before reading the snapshot so no update falls in between
    let mut rx = state.view.subscribe();
    let view = state.view.clone();

    let stream = async_stream::stream! {
        if let Some(event) = snapshot_event(&view.snapshot()) {
            yield Ok(event);
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }

                received = rx.recv() => {
                    match received {
                        Ok(snapshot) => {
                            if let Some(event) = snapshot_event(&snapshot) {
                                yield Ok(event);
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            // Only the latest state matters to the page
                            debug!(skipped, "SSE: Client lagged, resending current view");
                            if let Some(event) = snapshot_event(&view.snapshot()) {
                                yield Ok(event);
                            }
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(HEARTBEAT_INTERVAL).text("heartbeat"))
}

pub fn view_routes() -> Router<AppState> {
    Router::new()
        .route("/api/view", get(get_view))
        .route("/api/events", get(view_event_stream))
}
