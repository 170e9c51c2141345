//! Provider registry — static specs plus the factory that turns an
//! [`ActiveMode`] into a ready adapter.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::debug;

use voxrelay_core::config::Config;
use voxrelay_core::ActiveMode;

use crate::gemini::GeminiProvider;
use crate::local::LocalModelProvider;
use crate::openai::OpenAiProvider;
use crate::traits::{ChatProvider, RequestOptions};

// ─────────────────────────────────────────────
// ProviderSpec — static metadata for one provider
// ─────────────────────────────────────────────

/// Static specification describing one chat backend.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    /// Internal name, matching the serialized [`ActiveMode`].
    pub name: &'static str,
    /// Human-readable name for logs and error envelopes.
    pub display_name: &'static str,
    /// Environment variable that enables the provider.
    pub env_key: &'static str,
    /// Default API base URL. Empty for the local adapter.
    pub default_api_base: &'static str,
}

pub static OPENAI: ProviderSpec = ProviderSpec {
    name: "openai",
    display_name: "OpenAI",
    env_key: "OPENAI_API_KEY",
    default_api_base: "https://api.openai.com/v1",
};

pub static GEMINI: ProviderSpec = ProviderSpec {
    name: "gemini",
    display_name: "Gemini",
    env_key: "GEMINI_API_KEY",
    default_api_base: "https://generativelanguage.googleapis.com/v1beta",
};

pub static LOCAL: ProviderSpec = ProviderSpec {
    name: "local",
    display_name: "Local model",
    env_key: "LLAMA_BIN",
    default_api_base: "",
};

/// All chat backends, in remote selection order followed by the local one.
pub static PROVIDERS: [&ProviderSpec; 3] = [&OPENAI, &GEMINI, &LOCAL];

/// Find a spec by its internal name.
fn find_by_name(name: &str) -> Option<&'static ProviderSpec> {
    PROVIDERS.iter().copied().find(|s| s.name == name)
}

/// Spec for a mode; `None` has no backend.
pub fn spec_for_mode(mode: ActiveMode) -> Option<&'static ProviderSpec> {
    match mode {
        ActiveMode::None => None,
        other => find_by_name(other.as_str()),
    }
}

// ─────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────

/// Build the adapter for `mode` from a config snapshot.
pub fn create_provider(
    client: &reqwest::Client,
    mode: ActiveMode,
    config: &Config,
) -> Result<Arc<dyn ChatProvider>> {
    let options = RequestOptions::from(&config.request);

    let provider: Arc<dyn ChatProvider> = match mode {
        ActiveMode::OpenAi => Arc::new(OpenAiProvider::new(
            client.clone(),
            &config.providers.openai,
            options,
        )),
        ActiveMode::Gemini => Arc::new(GeminiProvider::new(
            client.clone(),
            &config.providers.gemini,
            options,
        )),
        ActiveMode::Local => Arc::new(LocalModelProvider::new(&config.local, options)),
        ActiveMode::None => {
            bail!("No provider configured. Set OPENAI_API_KEY or GEMINI_API_KEY.")
        }
    };

    debug!(
        provider = provider.display_name(),
        model = provider.model(),
        "Creating chat provider"
    );

    Ok(provider)
}

/// Seam between the request handler and adapter construction.
///
/// The server builds a fresh adapter per request from the current config
/// snapshot; tests substitute a factory that returns scripted providers.
pub trait ProviderFactory: Send + Sync {
    fn build(&self, mode: ActiveMode, config: &Config) -> Result<Arc<dyn ChatProvider>>;
}

/// Factory backed by a shared, connection-pooled HTTP client.
#[derive(Clone, Debug, Default)]
pub struct DefaultProviderFactory {
    client: reqwest::Client,
}

impl DefaultProviderFactory {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl ProviderFactory for DefaultProviderFactory {
    fn build(&self, mode: ActiveMode, config: &Config) -> Result<Arc<dyn ChatProvider>> {
        create_provider(&self.client, mode, config)
    }
}
