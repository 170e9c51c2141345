//! Configuration schema.
//!
//! Hierarchy: `Config` → `ServerConfig`, `ProvidersConfig`, `LocalModelConfig`,
//! `RequestConfig`, `SpeechConfig`.
//!
//! JSON on disk uses **camelCase** keys; Rust uses snake_case.

use serde::{Deserialize, Serialize};

/// Default OpenAI-style chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
/// Default Gemini-style model (flash tier).
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

// ─────────────────────────────────────────────
// Root Config
// ─────────────────────────────────────────────

/// Root configuration — loaded from `~/.voxrelay/config.json` + env vars.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
    pub local: LocalModelConfig,
    pub request: RequestConfig,
    pub speech: SpeechConfig,
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served as static files, with `index.html` as the catch-all.
    pub static_dir: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            static_dir: "public".to_string(),
        }
    }
}

// ─────────────────────────────────────────────
// Providers
// ─────────────────────────────────────────────

/// Configuration for a single remote LLM provider.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Custom API base URL (overrides the provider default).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Model identifier sent with each request.
    pub model: String,
}

impl ProviderConfig {
    fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..Default::default()
        }
    }

    /// Whether this provider has a configured API key.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// Server-side speech provider (ElevenLabs-style streaming TTS).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechProviderConfig {
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    /// Voice used when a request does not name one.
    pub voice: String,
}

impl Default for SpeechProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: None,
            voice: "alloy".to_string(),
        }
    }
}

impl SpeechProviderConfig {
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// All provider configurations.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProvidersConfig {
    pub openai: ProviderConfig,
    pub gemini: ProviderConfig,
    pub elevenlabs: SpeechProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderConfig::with_model(DEFAULT_OPENAI_MODEL),
            gemini: ProviderConfig::with_model(DEFAULT_GEMINI_MODEL),
            elevenlabs: SpeechProviderConfig::default(),
        }
    }
}

// ─────────────────────────────────────────────
// Local model
// ─────────────────────────────────────────────

/// Where the local-process adapter sits relative to the remote providers.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocalPrecedence {
    /// Never select the local adapter.
    #[default]
    Disabled,
    /// Always select the local adapter, even when remote keys are set.
    Prefer,
    /// Select the local adapter only when no remote key is set.
    Fallback,
}

impl std::str::FromStr for LocalPrecedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disabled" | "off" | "false" | "0" => Ok(Self::Disabled),
            "prefer" | "on" | "true" | "1" => Ok(Self::Prefer),
            "fallback" => Ok(Self::Fallback),
            other => Err(format!("unknown local model precedence '{other}'")),
        }
    }
}

/// How the local adapter separates an echoed prompt from the generation.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptEcho {
    /// Remove the prompt from the head of the output when it is echoed there.
    #[default]
    Strip,
    /// Ask the binary not to echo the prompt (`--no-display-prompt`).
    Suppress,
}

impl std::str::FromStr for PromptEcho {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strip" => Ok(Self::Strip),
            "suppress" => Ok(Self::Suppress),
            other => Err(format!("unknown prompt echo mode '{other}'")),
        }
    }
}

/// Local model binary (llama.cpp style CLI).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct LocalModelConfig {
    pub binary: String,
    pub model_path: String,
    pub precedence: LocalPrecedence,
    pub prompt_echo: PromptEcho,
    /// Number of tokens to predict (`-n`).
    pub n_predict: u32,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            binary: "./bin/llama".to_string(),
            model_path: "./models/ggml-model-q4_0.bin".to_string(),
            precedence: LocalPrecedence::Disabled,
            prompt_echo: PromptEcho::Strip,
            n_predict: 256,
        }
    }
}

// ─────────────────────────────────────────────
// Request defaults
// ─────────────────────────────────────────────

/// Sampling and transport settings shared by every adapter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestConfig {
    /// Sampling temperature (0.0 – 2.0).
    pub temperature: f64,
    /// Output token cap for remote providers.
    pub max_tokens: u32,
    /// Upper bound on a single outbound call, in seconds.
    pub timeout_secs: u64,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: 60,
        }
    }
}

// ─────────────────────────────────────────────
// Speech (client side)
// ─────────────────────────────────────────────

/// On-device speech synthesis used by the terminal client.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// TTS command (`espeak`, `espeak-ng`, or `say`).
    pub command: String,
    /// Preferred voice name; English is chosen when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Speaking rate relative to the engine default.
    pub rate: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: if cfg!(target_os = "macos") { "say" } else { "espeak" }.to_string(),
            voice: None,
            rate: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.providers.openai.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.providers.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.local.precedence, LocalPrecedence::Disabled);
        assert_eq!(config.request.timeout_secs, 60);
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let provider = ProviderConfig {
            api_key: "   ".to_string(),
            ..Default::default()
        };
        assert!(!provider.is_configured());
    }

    #[test]
    fn test_partial_json_keeps_model_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"providers": {"openai": {"apiKey": "sk-1"}}}"#).unwrap();
        assert!(config.providers.openai.is_configured());
        // Missing sections fall back to the section default, not the field default
        assert_eq!(config.providers.gemini.model, DEFAULT_GEMINI_MODEL);
    }

    #[test]
    fn test_precedence_parsing() {
        assert_eq!("prefer".parse::<LocalPrecedence>(), Ok(LocalPrecedence::Prefer));
        assert_eq!("OFF".parse::<LocalPrecedence>(), Ok(LocalPrecedence::Disabled));
        assert_eq!("fallback".parse::<LocalPrecedence>(), Ok(LocalPrecedence::Fallback));
        assert!("sometimes".parse::<LocalPrecedence>().is_err());
    }

    #[test]
    fn test_precedence_serializes_lowercase() {
        let json = serde_json::to_value(LocalPrecedence::Fallback).unwrap();
        assert_eq!(json, "fallback");
    }
}
