//! `voxrelay serve` — run the HTTP relay.
//!
//! Startup sequence:
//! 1. Load config (file + env) for the listen address and startup report
//! 2. Build state that re-reads config on every request
//! 3. Serve until Ctrl+C, then drain in-flight requests

use std::net::SocketAddr;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::{info, warn};

use voxrelay_core::config::load_config;
use voxrelay_core::{active_model, select_mode, ActiveMode};
use voxrelay_server::{run_server, AppState};

use crate::helpers;

pub async fn run() -> Result<()> {
    let config = load_config(None);
    let mode = select_mode(&config);
    let model = active_model(&config, mode).unwrap_or("-");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let static_dir = helpers::expand_tilde(&config.server.static_dir);

    println!();
    println!("{}", "🔊 voxrelay".cyan().bold());
    println!("  Listening: http://{addr}");
    println!("  Mode:      {mode} ({model})");
    println!();

    info!(port = config.server.port, mode = %mode, model, "Starting relay");
    if mode == ActiveMode::None {
        warn!("No provider configured; chat requests will fail until OPENAI_API_KEY or GEMINI_API_KEY is set");
    }

    run_server(AppState::from_env(), addr, static_dir, shutdown_signal()).await?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}
