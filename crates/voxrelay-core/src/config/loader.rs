//! Config loader — reads `~/.voxrelay/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.voxrelay/config.json`
//! 3. Environment variables (`PORT`, `OPENAI_API_KEY`, `GEMINI_API_KEY`, …)

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::schema::{Config, DEFAULT_GEMINI_MODEL, DEFAULT_OPENAI_MODEL};

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + process env vars.
///
/// Falls back to defaults if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    let config = load_config_from_path(&config_path);
    let config = apply_env_overrides(config, |key| std::env::var(key).ok());
    fill_model_defaults(config)
}

/// Load config from a specific file path, without env overrides.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        debug!("No config file found at {}, using defaults", path.display());
        return Config::default();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to parse config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path.map(PathBuf::from).unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// `lookup` resolves a variable name to its value; the server passes
/// `std::env::var`, tests pass a map.
///
/// Supported overrides:
/// - `HOST`, `PORT`, `STATIC_DIR` → `server.*`
/// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_API_BASE` → `providers.openai.*`
/// - `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_API_BASE` → `providers.gemini.*`
/// - `ELEVENLABS_API_KEY`, `ELEVENLABS_VOICE` → `providers.elevenlabs.*`
/// - `LLAMA_BIN`, `LLAMA_MODEL_PATH`, `LOCAL_MODEL`, `LOCAL_PROMPT_ECHO` → `local.*`
/// - `PROVIDER_TIMEOUT_SECS` → `request.timeout_secs`
pub fn apply_env_overrides<F>(mut config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    // Server
    if let Some(val) = lookup("HOST") {
        config.server.host = val;
    }
    if let Some(val) = lookup("PORT") {
        match val.parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(_) => warn!(value = %val, "ignoring invalid PORT"),
        }
    }
    if let Some(val) = lookup("STATIC_DIR") {
        config.server.static_dir = val;
    }

    // Remote providers
    if let Some(val) = lookup("OPENAI_API_KEY") {
        config.providers.openai.api_key = val;
    }
    if let Some(val) = lookup("OPENAI_MODEL") {
        config.providers.openai.model = val;
    }
    if let Some(val) = lookup("OPENAI_API_BASE") {
        config.providers.openai.api_base = Some(val);
    }
    if let Some(val) = lookup("GEMINI_API_KEY") {
        config.providers.gemini.api_key = val;
    }
    if let Some(val) = lookup("GEMINI_MODEL") {
        config.providers.gemini.model = val;
    }
    if let Some(val) = lookup("GEMINI_API_BASE") {
        config.providers.gemini.api_base = Some(val);
    }
    if let Some(val) = lookup("ELEVENLABS_API_KEY") {
        config.providers.elevenlabs.api_key = val;
    }
    if let Some(val) = lookup("ELEVENLABS_VOICE") {
        config.providers.elevenlabs.voice = val;
    }

    // Local model
    if let Some(val) = lookup("LLAMA_BIN") {
        config.local.binary = val;
    }
    if let Some(val) = lookup("LLAMA_MODEL_PATH") {
        config.local.model_path = val;
    }
    if let Some(val) = lookup("LOCAL_MODEL") {
        match val.parse() {
            Ok(p) => config.local.precedence = p,
            Err(e) => warn!(error = %e, "ignoring LOCAL_MODEL"),
        }
    }
    if let Some(val) = lookup("LOCAL_PROMPT_ECHO") {
        match val.parse() {
            Ok(e) => config.local.prompt_echo = e,
            Err(e) => warn!(error = %e, "ignoring LOCAL_PROMPT_ECHO"),
        }
    }

    // Request
    if let Some(val) = lookup("PROVIDER_TIMEOUT_SECS") {
        match val.parse::<u64>() {
            Ok(n) if n > 0 => config.request.timeout_secs = n,
            _ => warn!(value = %val, "ignoring invalid PROVIDER_TIMEOUT_SECS"),
        }
    }

    config
}

/// Restore default model names left blank by a partial config file or an
/// empty env var.
fn fill_model_defaults(mut config: Config) -> Config {
    if config.providers.openai.model.trim().is_empty() {
        config.providers.openai.model = DEFAULT_OPENAI_MODEL.to_string();
    }
    if config.providers.gemini.model.trim().is_empty() {
        config.providers.gemini.model = DEFAULT_GEMINI_MODEL.to_string();
    }
    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
