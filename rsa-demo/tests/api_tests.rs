//! Integration tests for rsa-demo API endpoints
//!
//! Tests cover:
//! - Health and build info
//! - Analyze workflow: success, not ready, busy, classifier failure
//! - Telemetry isolation from the displayed result
//! - Token save / clear / restore
//! - View snapshot endpoint and page assets

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use rsa_demo::classifier::{ClassifierError, SentimentClassifier};
use rsa_demo::reviews::{Review, ReviewStore};
use rsa_demo::telemetry::{TelemetryEmitter, TelemetryError, TelemetryEvent, TelemetrySink};
use rsa_demo::{build_router, startup, AppState};
use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tower::util::ServiceExt; // for `oneshot` method

// =============================================================================
// Test doubles
// =============================================================================

/// Returns a fixed model output
struct FixedClassifier {
    output: Value,
}

#[async_trait]
impl SentimentClassifier for FixedClassifier {
    fn model_id(&self) -> &str {
        "fixed"
    }

    async fn initialize(&self) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn classify(&self, _text: &str) -> Result<Value, ClassifierError> {
        Ok(self.output.clone())
    }
}

/// Always rejects classification
struct RejectingClassifier;

#[async_trait]
impl SentimentClassifier for RejectingClassifier {
    fn model_id(&self) -> &str {
        "rejecting"
    }

    async fn initialize(&self) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn classify(&self, _text: &str) -> Result<Value, ClassifierError> {
        Err(ClassifierError::Api {
            status: 500,
            body: "inference backend down".to_string(),
        })
    }
}

/// Holds every classification until released
struct BlockingClassifier {
    release: Arc<Notify>,
}

#[async_trait]
impl SentimentClassifier for BlockingClassifier {
    fn model_id(&self) -> &str {
        "blocking"
    }

    async fn initialize(&self) -> Result<(), ClassifierError> {
        Ok(())
    }

    async fn classify(&self, _text: &str) -> Result<Value, ClassifierError> {
        self.release.notified().await;
        Ok(json!([[{"label": "NEGATIVE", "score": 0.8}]]))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingSink {
    /// Wait for the detached delivery task
    async fn wait_for_events(&self, count: usize) -> Vec<TelemetryEvent> {
        for _ in 0..100 {
            if self.events.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn send(&self, event: &TelemetryEvent) -> Result<(), TelemetryError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct FailingSink;

#[async_trait]
impl TelemetrySink for FailingSink {
    async fn send(&self, _event: &TelemetryEvent) -> Result<(), TelemetryError> {
        Err(TelemetryError::Delivery("connection refused".to_string()))
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Test helper: single-connection in-memory settings database
async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    rsa_common::db::create_settings_table(&pool)
        .await
        .expect("Should create settings table");
    pool
}

const SAMPLE_REVIEWS: [&str; 2] = ["Great phone, battery lasts all day", "Broke after a week"];

fn sample_reviews() -> ReviewStore {
    ReviewStore::from_reviews(SAMPLE_REVIEWS.iter().filter_map(|text| Review::new(text)).collect())
}

/// Test helper: state with reviews loaded and no classifier yet
async fn setup_state(telemetry: TelemetryEmitter) -> AppState {
    AppState::new(setup_test_db().await, telemetry).with_reviews(sample_reviews())
}

/// Test helper: state with reviews loaded and `classifier` ready
async fn ready_state(
    classifier: Arc<dyn SentimentClassifier>,
    telemetry: TelemetryEmitter,
) -> AppState {
    let state = setup_state(telemetry).await;
    state
        .classifier
        .initialize(classifier)
        .await
        .expect("Test classifier should initialize");
    state
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn analyze_request() -> Request<Body> {
    json_request(
        "POST",
        "/api/analyze",
        json!({
            "url": "http://127.0.0.1:5780/",
            "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
            "language": "en-US",
            "platform": "Linux x86_64"
        }),
    )
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

// =============================================================================
// Health / build info
// =============================================================================

#[tokio::test]
async fn test_health_starting_before_init() {
    let state = AppState::new(setup_test_db().await, TelemetryEmitter::disabled());
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "starting");
    assert_eq!(body["module"], "rsa-demo");
    assert_eq!(body["reviews_loaded"], 0);
    assert_eq!(body["model_ready"], false);
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_ok_when_ready() {
    let state = ready_state(
        Arc::new(FixedClassifier { output: json!([]) }),
        TelemetryEmitter::disabled(),
    )
    .await;
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["reviews_loaded"], 2);
    assert_eq!(body["model_ready"], true);
}

#[tokio::test]
async fn test_health_degraded_after_startup_error() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    state.record_error("Model unavailable: nope").await;
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["last_error"], "Model unavailable: nope");
}

#[tokio::test]
async fn test_buildinfo() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state);

    let response = app
        .oneshot(test_request("GET", "/api/buildinfo"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["git_hash"].is_string());
}

// =============================================================================
// Analyze workflow
// =============================================================================

#[tokio::test]
async fn test_analyze_positive_review() {
    let sink = Arc::new(RecordingSink::default());
    let state = ready_state(
        Arc::new(FixedClassifier {
            output: json!([[{"label": "positive", "score": 0.93}]]),
        }),
        TelemetryEmitter::new(sink.clone()),
    )
    .await;
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sentiment"], "positive");
    assert_eq!(body["label"], "POSITIVE");
    assert_eq!(body["confidence_display"], "93.0%");
    let review = body["review"].as_str().unwrap().to_string();
    assert!(SAMPLE_REVIEWS.contains(&review.as_str()));

    let view = state.view.snapshot();
    assert_eq!(view.review_text.as_deref(), Some(review.as_str()));
    assert!(!view.loading);
    assert!(view.trigger_enabled);
    assert!(view.error.is_none());
    let rendered = view.result.expect("Result should be rendered");
    assert_eq!(rendered.style_class, "sentiment-result positive");
    assert_eq!(rendered.icon, "fa-thumbs-up");
    assert_eq!(rendered.text, "POSITIVE (93.0% confidence)");

    let events = sink.wait_for_events(1).await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].review, review);
    assert_eq!(events[0].sentiment, "POSITIVE (93.0%)");
    assert_eq!(events[0].meta.url, "http://127.0.0.1:5780/");
    assert_eq!(events[0].meta.user_agent, "Mozilla/5.0 (X11; Linux x86_64)");
    assert_eq!(events[0].meta.language, "en-US");
    assert!(events[0].ts_iso.ends_with('Z'));
}

#[tokio::test]
async fn test_analyze_malformed_output_is_neutral() {
    let state = ready_state(
        Arc::new(FixedClassifier {
            output: json!({"unexpected": true}),
        }),
        TelemetryEmitter::disabled(),
    )
    .await;
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sentiment"], "neutral");
    assert_eq!(body["label"], "NEUTRAL");
    assert_eq!(body["confidence_display"], "50.0%");

    let rendered = state.view.snapshot().result.unwrap();
    assert_eq!(rendered.icon, "fa-question-circle");
}

#[tokio::test]
async fn test_analyze_without_body_uses_headers() {
    let sink = Arc::new(RecordingSink::default());
    let state = ready_state(
        Arc::new(FixedClassifier {
            output: json!([[{"label": "NEGATIVE", "score": 0.5001}]]),
        }),
        TelemetryEmitter::new(sink.clone()),
    )
    .await;
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/api/analyze")
        .header(header::USER_AGENT, "curl/8.5.0")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["sentiment"], "negative");
    assert_eq!(body["confidence_display"], "50.0%");

    let events = sink.wait_for_events(1).await;
    assert_eq!(events[0].meta.user_agent, "curl/8.5.0");
    assert_eq!(events[0].sentiment, "NEGATIVE (50.0%)");
}

#[tokio::test]
async fn test_analyze_not_ready_without_model() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "NOT_READY");
    assert_eq!(body["error"]["message"], "Model or reviews not ready");

    let view = state.view.snapshot();
    assert_eq!(view.error.as_deref(), Some("Model or reviews not ready"));
    assert!(!view.loading);
    assert!(view.trigger_enabled);
    assert!(view.review_text.is_none());
}

#[tokio::test]
async fn test_analyze_not_ready_without_reviews() {
    let state = AppState::new(setup_test_db().await, TelemetryEmitter::disabled());
    state
        .classifier
        .initialize(Arc::new(FixedClassifier { output: json!([]) }))
        .await
        .unwrap();
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let view = state.view.snapshot();
    assert!(view.trigger_enabled);
    assert!(!view.loading);
}

#[tokio::test]
async fn test_analyze_classifier_failure() {
    let state = ready_state(Arc::new(RejectingClassifier), TelemetryEmitter::disabled()).await;
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

    let view = state.view.snapshot();
    assert_eq!(view.error.as_deref(), Some("Failed to analyze sentiment"));
    assert!(view.result.is_none());
    assert!(!view.loading);
    assert!(view.trigger_enabled);
    // The attempted review stays visible
    assert!(view.review_text.is_some());
}

#[tokio::test]
async fn test_error_cleared_on_next_action() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state.clone());

    let response = app.clone().oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(state.view.snapshot().error.is_some());

    state
        .classifier
        .initialize(Arc::new(FixedClassifier {
            output: json!([[{"label": "POSITIVE", "score": 0.7}]]),
        }))
        .await
        .unwrap();

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(state.view.snapshot().error.is_none());
}

#[tokio::test]
async fn test_second_analyze_while_busy_is_rejected() {
    let release = Arc::new(Notify::new());
    let state = ready_state(
        Arc::new(BlockingClassifier {
            release: release.clone(),
        }),
        TelemetryEmitter::disabled(),
    )
    .await;
    let app = build_router(state.clone());

    let first = tokio::spawn(app.clone().oneshot(analyze_request()));

    for _ in 0..200 {
        if !state.view.trigger_enabled() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let in_flight = state.view.snapshot();
    assert!(in_flight.loading);
    assert!(!in_flight.trigger_enabled);

    let second = app.clone().oneshot(analyze_request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    // Rejected trigger leaves the view untouched
    assert_eq!(state.view.snapshot().revision, in_flight.revision);

    release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let view = state.view.snapshot();
    assert!(view.trigger_enabled);
    assert!(!view.loading);
    assert_eq!(view.result.unwrap().style_class, "sentiment-result negative");
}

#[tokio::test]
async fn test_telemetry_failure_does_not_change_result() {
    let state = ready_state(
        Arc::new(FixedClassifier {
            output: json!([[{"label": "NEGATIVE", "score": 0.91}]]),
        }),
        TelemetryEmitter::new(Arc::new(FailingSink)),
    )
    .await;
    let app = build_router(state.clone());

    let response = app.oneshot(analyze_request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    tokio::time::sleep(Duration::from_millis(20)).await;

    let view = state.view.snapshot();
    assert!(view.error.is_none());
    let rendered = view.result.unwrap();
    assert_eq!(rendered.text, "NEGATIVE (91.0% confidence)");
    assert_eq!(rendered.style_class, "sentiment-result negative");
}

// =============================================================================
// Token
// =============================================================================

#[tokio::test]
async fn test_token_save_and_clear() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/token",
            json!({"token": "  hf_abc123  "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["stored"], true);
    assert_eq!(state.view.snapshot().token_input, "hf_abc123");

    let response = app
        .clone()
        .oneshot(test_request("GET", "/api/token"))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["has_token"], true);
    assert_eq!(body["token"], "hf_abc123");

    let response = app
        .clone()
        .oneshot(json_request("POST", "/api/token", json!({"token": "   "})))
        .await
        .unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["stored"], false);
    assert_eq!(state.view.snapshot().token_input, "");

    let response = app.oneshot(test_request("GET", "/api/token")).await.unwrap();
    let body = extract_json(response.into_body()).await;
    assert_eq!(body["has_token"], false);
    assert!(body["token"].is_null());

    let persisted: Option<String> =
        rsa_common::db::settings::get_setting(&state.db, "hf_api_token")
            .await
            .unwrap();
    assert!(persisted.is_none());
}

#[tokio::test]
async fn test_saved_token_restored_on_startup() {
    let db = setup_test_db().await;

    let first = AppState::new(db.clone(), TelemetryEmitter::disabled());
    first.credentials.save("hf_persisted").await.unwrap();

    // Fresh state over the same database, as after a restart
    let second = AppState::new(db, TelemetryEmitter::disabled());
    startup::restore_saved_token(&second).await;

    assert_eq!(second.view.snapshot().token_input, "hf_persisted");
    assert_eq!(
        second.credentials.token().await.as_deref(),
        Some("hf_persisted")
    );
}

// =============================================================================
// View and page
// =============================================================================

#[tokio::test]
async fn test_view_snapshot_endpoint() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    startup::refresh_status(&state).await;
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/api/view")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["phase"], "idle");
    assert_eq!(body["loading"], false);
    assert_eq!(body["trigger_enabled"], true);
    assert_eq!(body["status"], "Reviews: 2 loaded | Model: loading");
}

#[tokio::test]
async fn test_events_stream_content_type() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/api/events")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/event-stream"));
}

#[tokio::test]
async fn test_page_has_bound_elements() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state);

    let response = app.oneshot(test_request("GET", "/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    for id in [
        "analyze-btn",
        "review-text",
        "sentiment-result",
        "error-message",
        "api-token",
        "status",
    ] {
        assert!(html.contains(&format!("id=\"{}\"", id)), "missing #{}", id);
    }
    assert!(html.contains("class=\"loading\""));
}

#[tokio::test]
async fn test_script_resets_revision_on_reconnect() {
    let state = setup_state(TelemetryEmitter::disabled()).await;
    let app = build_router(state);

    let response = app
        .oneshot(test_request("GET", "/static/app.js"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // A restarted service counts revisions from zero again
    let script = extract_text(response.into_body()).await;
    let onopen = script.find("events.onopen").expect("onopen handler");
    let reset = script[onopen..].find("lastRevision = -1").expect("revision reset");
    assert!(reset < script[onopen..].find("};").unwrap());
}
