//! Chat provider trait — the uniform prompt → answer contract.
//!
//! Every backend (OpenAI-style, Gemini-style, local process) implements
//! [`ChatProvider`]. The server only ever talks to this trait.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use voxrelay_core::config::schema::RequestConfig;

use crate::error::ProviderError;

/// Answer used when a provider responds successfully but carries no text.
pub const NO_RESPONSE: &str = "No response.";

/// Sampling and transport options passed to each adapter.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestOptions {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Upper bound on the single outbound call.
    pub timeout: Duration,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::from(&RequestConfig::default())
    }
}

impl From<&RequestConfig> for RequestOptions {
    fn from(config: &RequestConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

/// A successful adapter call.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderReply {
    /// Plain-text answer, trimmed.
    pub answer: String,
    /// Provider-native payload, kept for diagnostics.
    pub raw: Option<Value>,
}

impl ProviderReply {
    /// Build a reply from an optional extracted answer, trimming it and
    /// substituting [`NO_RESPONSE`] when it is absent or blank.
    pub fn from_answer(answer: Option<&str>, raw: Option<Value>) -> Self {
        let answer = answer
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(NO_RESPONSE)
            .to_string();
        Self { answer, raw }
    }
}

/// Trait that all chat backends implement.
///
/// Implementations make at most one outbound call per `submit` and never
/// retry.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send a single prompt and return the provider's answer.
    ///
    /// Expected failures (non-2xx, provider error bodies, timeouts, process
    /// exits) come back as `Err(ProviderError)`; malformed bodies degrade to
    /// [`NO_RESPONSE`] rather than an error.
    async fn submit(&self, prompt: &str) -> Result<ProviderReply, ProviderError>;

    /// Model identifier used for requests.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str;

    /// Outbound target for logging. Never includes credentials.
    fn endpoint(&self) -> String;
}
