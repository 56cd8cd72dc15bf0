//! Access token endpoints
//!
//! Backing for the token input field. Saving an empty value clears the
//! stored token.

use crate::{ApiResult, AppState};
use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

/// Request payload for saving the token
#[derive(Debug, Deserialize)]
pub struct SaveTokenRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SaveTokenResponse {
    pub success: bool,
    /// false when the input was blank and the token was removed
    pub stored: bool,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub has_token: bool,
    pub token: Option<String>,
}

/// GET /api/token
pub async fn get_token(State(state): State<AppState>) -> Json<TokenResponse> {
    let token = state.credentials.token().await;
    Json(TokenResponse {
        has_token: token.is_some(),
        token,
    })
}

/// POST /api/token
///
/// **Request:** `{"token": "hf_..."}`
/// **Response:** `{"success": true, "stored": true}`
pub async fn save_token(
    State(state): State<AppState>,
    Json(payload): Json<SaveTokenRequest>,
) -> ApiResult<Json<SaveTokenResponse>> {
    let stored = state.credentials.save(&payload.token).await?;
    state
        .view
        .set_token_input(stored.as_deref().unwrap_or_default());

    Ok(Json(SaveTokenResponse {
        success: true,
        stored: stored.is_some(),
    }))
}

pub fn token_routes() -> Router<AppState> {
    Router::new().route("/api/token", get(get_token).post(save_token))
}
