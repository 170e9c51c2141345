//! Shared handler state.

use std::sync::Arc;

use voxrelay_core::config::{ConfigSource, EnvConfigSource};
use voxrelay_providers::{DefaultProviderFactory, ProviderFactory};

/// State shared by every handler.
///
/// Holds no per-request data: configuration is snapshotted on each request
/// and adapters are built fresh from that snapshot.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<dyn ConfigSource>,
    pub providers: Arc<dyn ProviderFactory>,
    /// Pooled client for server-side calls outside the chat adapters.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: Arc<dyn ConfigSource>, providers: Arc<dyn ProviderFactory>) -> Self {
        Self {
            config,
            providers,
            http: reqwest::Client::new(),
        }
    }

    /// State reading `~/.voxrelay/config.json` and the environment per request.
    pub fn from_env() -> Self {
        let http = reqwest::Client::new();
        Self {
            config: Arc::new(EnvConfigSource::default()),
            providers: Arc::new(DefaultProviderFactory::new(http.clone())),
            http,
        }
    }
}
