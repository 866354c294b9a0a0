//! Inbound update boundary: one POST route whose path segment is the bot
//! token, so only the platform (which knows the token) can reach the
//! handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;

use countmein_core::error::CoreError;
use countmein_core::{callback, conversation, inline, AppState};
use countmein_models::update::Update;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("not found")]
    UnknownToken,
    #[error("internal server error")]
    Internal(#[from] CoreError),
}

impl WebhookError {
    fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::UnknownToken => StatusCode::NOT_FOUND,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            WebhookError::UnknownToken => "NOT_FOUND",
            WebhookError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        if let WebhookError::Internal(err) = &self {
            tracing::error!("webhook internal error: {err}");
        }
        let body = json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        (self.status_code(), Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/webhook/{token}", post(receive_update))
        .with_state(state)
}

async fn liveness() -> &'static str {
    "CountMeIn Bot is running.\n"
}

/// Compared without short-circuiting on the first differing byte, so
/// response timing does not narrow down the token.
fn token_matches(candidate: &str, expected: &str) -> bool {
    candidate.len() == expected.len()
        && candidate
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

async fn receive_update(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(update): Json<Update>,
) -> Result<&'static str, WebhookError> {
    if !token_matches(&token, &state.config.bot_token) {
        return Err(WebhookError::UnknownToken);
    }

    tracing::debug!(update_id = update.update_id, "update received");
    if let Some(message) = &update.message {
        conversation::handle_message(&state, message).await?;
    } else if let Some(query) = &update.callback_query {
        callback::handle_callback(&state, query).await?;
    } else if let Some(query) = &update.inline_query {
        inline::handle_inline_query(&state, query).await?;
    } else {
        tracing::debug!(update_id = update.update_id, "update type not handled");
    }
    Ok("ok")
}
