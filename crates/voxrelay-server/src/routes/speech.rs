//! `POST /api/tts` — server-side synthesis streamed back as audio.

use std::time::Duration;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use voxrelay_core::ErrorEnvelope;
use voxrelay_providers::{ElevenLabsSpeech, SpeechSynthesizer, TtsError};
use voxrelay_speech::sanitize;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice: Option<String>,
}

fn error_response(status: StatusCode, envelope: ErrorEnvelope) -> Response {
    (status, Json(envelope)).into_response()
}

fn tts_error_response(err: TtsError) -> Response {
    match err {
        TtsError::NotConfigured => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorEnvelope::new("Speech provider not configured"),
        ),
        TtsError::InvalidVoice(voice) => error_response(
            StatusCode::BAD_REQUEST,
            ErrorEnvelope::new("Invalid voice")
                .with_details(json!({ "message": format!("unsupported voice id '{voice}'") })),
        ),
        TtsError::Upstream { status, body } => {
            let status = StatusCode::from_u16(status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(
                status,
                ErrorEnvelope::new("TTS error").with_details(json!({ "message": body })),
            )
        }
        TtsError::Transport(e) => {
            error!(error = %e, "Speech request failed");
            let status = if e.is_timeout() {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            error_response(status, ErrorEnvelope::new("TTS error"))
        }
    }
}

pub async fn tts(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = payload else {
        return error_response(StatusCode::BAD_REQUEST, ErrorEnvelope::new("Missing text"));
    };

    let text = sanitize(&request.text);
    if text.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, ErrorEnvelope::new("Missing text"));
    }

    let config = state.config.snapshot();
    let speech = ElevenLabsSpeech::new(
        state.http.clone(),
        &config.providers.elevenlabs,
        Duration::from_secs(config.request.timeout_secs),
    );

    debug!(provider = speech.display_name(), "Synthesizing speech");

    match speech.synthesize(&text, request.voice.as_deref()).await {
        Ok(upstream) => {
            let content_type = upstream
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("audio/mpeg")
                .to_string();
            let stream = upstream.bytes_stream().map_err(std::io::Error::other);
            (
                [(header::CONTENT_TYPE, content_type)],
                Body::from_stream(stream),
            )
                .into_response()
        }
        Err(e) => tts_error_response(e),
    }
}
