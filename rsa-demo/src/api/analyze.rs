//! Analyze endpoint
//!
//! `POST /api/analyze` is the trigger control. The body carries the
//! browser's client metadata for the interaction log; any field left out is
//! filled from request headers.

use crate::telemetry::ClientMeta;
use crate::workflow::{AnalysisController, AnalysisOutcome};
use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

/// Client metadata as sent by the page (`location.href`, `navigator.*`)
#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "userAgent")]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// First language tag of an `Accept-Language` header, without its q-value
fn primary_language(accept_language: &str) -> Option<String> {
    accept_language
        .split(',')
        .next()
        .and_then(|tag| tag.split(';').next())
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
}

/// Merge body fields with header fallbacks
pub fn client_meta(request: AnalyzeRequest, headers: &HeaderMap) -> ClientMeta {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    ClientMeta {
        url: non_empty(request.url)
            .or_else(|| header_str(headers, header::REFERER.as_str()).map(str::to_string))
            .unwrap_or_default(),
        user_agent: non_empty(request.user_agent)
            .or_else(|| header_str(headers, header::USER_AGENT.as_str()).map(str::to_string))
            .unwrap_or_default(),
        language: non_empty(request.language)
            .or_else(|| {
                header_str(headers, header::ACCEPT_LANGUAGE.as_str()).and_then(primary_language)
            })
            .unwrap_or_default(),
        platform: non_empty(request.platform)
            .or_else(|| {
                header_str(headers, "sec-ch-ua-platform")
                    .map(|platform| platform.trim_matches('"').to_string())
            })
            .unwrap_or_default(),
    }
}

/// POST /api/analyze
///
/// **Response:** `{"review": "...", "sentiment": "positive", "label": "POSITIVE",
/// "score": 0.93, "confidence_display": "93.0%"}`
///
/// **Errors:**
/// - 409 Conflict: an analysis is already running
/// - 503 Service Unavailable: model or reviews not ready
/// - 502 Bad Gateway: the classifier failed
pub async fn analyze(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<AnalyzeRequest>>,
) -> ApiResult<Json<AnalysisOutcome>> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let meta = client_meta(request, &headers);

    let outcome = AnalysisController::from_state(&state)
        .analyze_random_review(meta)
        .await?;

    Ok(Json(outcome))
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze))
}
