//! `GET /health` — which backend would answer right now.

use axum::extract::State;
use axum::Json;

use voxrelay_core::config::Config;
use voxrelay_core::utils::timestamp;
use voxrelay_core::{active_model, select_mode, HealthReport};

use crate::state::AppState;

/// Build a report from a config snapshot. Makes no network calls.
pub fn health_report(config: &Config) -> HealthReport {
    let mode = select_mode(config);
    HealthReport {
        ok: true,
        mode,
        model: active_model(config, mode).map(String::from),
        timestamp: timestamp(),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(health_report(&state.config.snapshot()))
}
