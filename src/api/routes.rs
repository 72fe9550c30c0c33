//! Endpoint handlers.
//!
//! Every handler answers with a [`ResponseEnvelope`]: 200 on success, 400 on
//! any failure, including unreadable bodies.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::envelope::ResponseEnvelope;
use crate::assistant::{AssistantSession, SessionOptions};
use crate::error::AppError;
use crate::store::acquire_refresh_token;
use crate::{AppState, SharedState};

pub fn endpoints(state: SharedState) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/refreshMyAccessToken", post(refresh_my_access_token))
        // Path spelling is what deployed clients call
        .route("/requestMyRefresToken", post(request_my_refresh_token))
        .route("/queryAssistant", post(query_assistant))
        .with_state(state)
}

async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "assistant-bridge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

fn parse_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(b)| b)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {}", e.body_text())))
}

/// A field that must be present and non-empty.
fn required(value: Option<String>, message: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(message.to_string()))
}

// =============================================================================
// Access token
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshAccessTokenBody {
    refresh_token: Option<String>,
}

/// POST /refreshMyAccessToken: Mint an access token from a refresh token.
async fn refresh_my_access_token(
    State(state): State<SharedState>,
    body: Result<Json<RefreshAccessTokenBody>, JsonRejection>,
) -> ResponseEnvelope {
    info!("---- RefreshMyAccessToken new request ----");

    let result = async {
        let body = parse_body(body)?;
        let refresh_token =
            required(body.refresh_token, "refreshToken is null or empty, check params")?;
        let access_token = state.oauth.refresh_access_token(&refresh_token).await?;
        Ok::<_, AppError>(access_token)
    }
    .await;

    match result {
        Ok(access_token) => ResponseEnvelope::new().succeed(access_token),
        Err(e) => ResponseEnvelope::new().fail(&e, "Error refreshing Access Token"),
    }
}

// =============================================================================
// Refresh token
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestRefreshTokenBody {
    user_auth_code: Option<String>,
}

/// POST /requestMyRefresToken: Exchange an authorization code.
///
/// Always performs a fresh exchange; the result is returned, not stored.
async fn request_my_refresh_token(
    State(state): State<SharedState>,
    body: Result<Json<RequestRefreshTokenBody>, JsonRejection>,
) -> ResponseEnvelope {
    info!("---- RequestMyRefreshToken new request ----");

    let result = async {
        let body = parse_body(body)?;
        let code = required(body.user_auth_code, "userAuthCode is null or empty, check params")?;
        let grant = state.oauth.exchange_code(&code).await?;
        Ok::<_, AppError>(grant)
    }
    .await;

    match result {
        Ok(grant) => ResponseEnvelope::new().succeed(grant.refresh_token),
        Err(e) => ResponseEnvelope::new().fail(&e, "Error getting Refresh Token"),
    }
}

// =============================================================================
// Assistant
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryAssistantBody {
    #[serde(rename = "idFB")]
    id_fb: Option<String>,
    /// Only needed until the user's refresh token is stored.
    user_auth_code: Option<String>,
    speaked_text: Option<String>,
}

/// POST /queryAssistant: Send a text command to the user's assistant.
async fn query_assistant(
    State(state): State<SharedState>,
    body: Result<Json<QueryAssistantBody>, JsonRejection>,
) -> ResponseEnvelope {
    info!("---- QueryAssistant new request ----");

    match run_query(&state, body).await {
        Ok(reply) => ResponseEnvelope::new().succeed(reply),
        Err(e) => ResponseEnvelope::new().fail(&e, "Error sending command"),
    }
}

async fn run_query(
    state: &AppState,
    body: Result<Json<QueryAssistantBody>, JsonRejection>,
) -> Result<String, AppError> {
    let body = parse_body(body)?;
    let id_fb = required(body.id_fb, "idFB is null or empty, check params")?;
    let text = required(body.speaked_text, "The command can't be null or empty")?;

    let refresh_token = acquire_refresh_token(
        state.store.as_ref(),
        state.oauth.as_ref(),
        &id_fb,
        body.user_auth_code.as_deref(),
    )
    .await?;

    let session = AssistantSession::new(refresh_token, SessionOptions::from_config(&state.config));

    let reply = state.assistant.query(&session, &text).await?;
    Ok(reply.text.unwrap_or_default())
}
