//! `POST /api/chat` — relay one prompt to the active provider.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use tracing::{debug, info, warn};

use voxrelay_core::{select_mode, ActiveMode, ChatRequest, ChatResponse};

use crate::error::ChatError;
use crate::state::AppState;

/// Validate, select a mode, dispatch to exactly one adapter.
pub async fn handle_chat(state: &AppState, payload: Value) -> Result<ChatResponse, ChatError> {
    let Some(request) = ChatRequest::from_payload(&payload) else {
        warn!("Rejected chat request without a prompt");
        return Err(ChatError::InvalidInput);
    };

    let config = state.config.snapshot();
    let mode = select_mode(&config);
    if mode == ActiveMode::None {
        warn!("Chat request with no provider configured");
        return Err(ChatError::Unconfigured);
    }

    let provider = state.providers.build(mode, &config)?;
    info!(
        mode = %mode,
        endpoint = %provider.endpoint(),
        model = provider.model(),
        "Relaying prompt"
    );

    let reply = provider.submit(&request.prompt).await?;
    debug!(mode = %mode, chars = reply.answer.chars().count(), "Provider answered");

    Ok(ChatResponse {
        answer: reply.answer,
        raw: reply.raw,
    })
}

pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatResponse>, ChatError> {
    let Json(payload) = payload.map_err(|rejection| {
        debug!(error = %rejection, "Unreadable chat body");
        ChatError::InvalidInput
    })?;
    handle_chat(&state, payload).await.map(Json)
}
