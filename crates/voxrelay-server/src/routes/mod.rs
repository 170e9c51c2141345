pub mod chat;
pub mod health;
pub mod speech;

use std::any::Any;
use std::path::Path;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use voxrelay_core::ErrorEnvelope;

use crate::state::AppState;

/// Assemble the relay's router.
///
/// When `static_dir` exists it is served for unmatched routes, with
/// `index.html` as the catch-all; otherwise unmatched routes get a JSON 404.
pub fn build_app(state: AppState, static_dir: impl AsRef<Path>) -> Router {
    let static_dir = static_dir.as_ref();

    let router = Router::new()
        .route("/health", get(health::health))
        .route("/api/chat", post(chat::chat))
        .route("/api/tts", post(speech::tts));

    let router = if static_dir.is_dir() {
        debug!(dir = %static_dir.display(), "Serving static files");
        let index = ServeFile::new(static_dir.join("index.html"));
        router.fallback_service(ServeDir::new(static_dir).fallback(index))
    } else {
        router.fallback(not_found)
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorEnvelope::new("Not found"))).into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::new("Server error")),
    )
        .into_response()
}
