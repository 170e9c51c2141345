//! Text-to-speech providers — server-side synthesis streamed back to the client.
//!
//! Currently supports ElevenLabs' streaming endpoint. The response body is
//! handed back unread so the caller can forward the audio as it arrives.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error};

use voxrelay_core::config::schema::SpeechProviderConfig;
use voxrelay_core::utils::truncate_string;

use crate::http::LOG_BODY_CHARS;

const DEFAULT_API_BASE: &str = "https://api.elevenlabs.io/v1";

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Failure of a synthesis request.
#[derive(Error, Debug)]
pub enum TtsError {
    #[error("speech provider is not configured")]
    NotConfigured,

    #[error("speech provider returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// Voice ids travel in the URL path, so only `[A-Za-z0-9_-]` is accepted.
    #[error("invalid voice id '{0}'")]
    InvalidVoice(String),

    #[error("speech request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Trait for server-side text-to-speech providers.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Start synthesizing `text` and return the streaming response.
    async fn synthesize(&self, text: &str, voice: Option<&str>)
        -> Result<reqwest::Response, TtsError>;

    /// Display name for logging.
    fn display_name(&self) -> &str;
}

// ─────────────────────────────────────────────
// ElevenLabs
// ─────────────────────────────────────────────

/// ElevenLabs streaming synthesis.
pub struct ElevenLabsSpeech {
    api_key: String,
    api_base: String,
    default_voice: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl ElevenLabsSpeech {
    pub fn new(client: reqwest::Client, config: &SpeechProviderConfig, timeout: Duration) -> Self {
        Self {
            api_key: config.api_key.clone(),
            api_base: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            default_voice: config.voice.clone(),
            timeout,
            client,
        }
    }

    /// Check if the synthesizer has an API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    fn stream_url(&self, voice: &str) -> Result<String, TtsError> {
        if !is_voice_id(voice) {
            return Err(TtsError::InvalidVoice(truncate_string(voice, 64)));
        }
        Ok(format!(
            "{}/text-to-speech/{}/stream",
            self.api_base.trim_end_matches('/'),
            voice
        ))
    }
}

fn is_voice_id(voice: &str) -> bool {
    !voice.is_empty()
        && voice
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
    ) -> Result<reqwest::Response, TtsError> {
        if !self.is_configured() {
            return Err(TtsError::NotConfigured);
        }

        let voice = voice
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(&self.default_voice);
        let url = self.stream_url(voice)?;

        debug!(voice, chars = text.chars().count(), "Requesting speech stream");

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("accept", "audio/mpeg")
            .timeout(self.timeout)
            .json(&json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, "Speech provider error");
            return Err(TtsError::Upstream {
                status: status.as_u16(),
                body: truncate_string(&body, LOG_BODY_CHARS),
            });
        }

        Ok(response)
    }

    fn display_name(&self) -> &str {
        "ElevenLabs"
    }
}
