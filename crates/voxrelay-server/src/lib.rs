//! HTTP relay for voxrelay.
//!
//! - `GET /health` — active mode and model
//! - `POST /api/chat` — relay a prompt to exactly one provider
//! - `POST /api/tts` — stream synthesized audio for a piece of text
//! - everything else — static client files, or a JSON 404

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub use error::ChatError;
pub use routes::build_app;
pub use routes::chat::handle_chat;
pub use routes::health::health_report;
pub use state::AppState;

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn run_server<F>(
    state: AppState,
    addr: SocketAddr,
    static_dir: impl AsRef<Path>,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let app = build_app(state, static_dir);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(addr = %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server failed")
}
