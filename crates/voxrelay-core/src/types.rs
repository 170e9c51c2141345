//! Request-scoped wire types shared by the server and its clients.
//!
//! Nothing here is persisted; every value lives for one request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─────────────────────────────────────────────
// Active mode
// ─────────────────────────────────────────────

/// The provider backend selected for a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActiveMode {
    OpenAi,
    Gemini,
    Local,
    None,
}

impl ActiveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActiveMode::OpenAi => "openai",
            ActiveMode::Gemini => "gemini",
            ActiveMode::Local => "local",
            ActiveMode::None => "none",
        }
    }
}

impl std::fmt::Display for ActiveMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Chat envelopes
// ─────────────────────────────────────────────

/// A validated chat prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    /// The prompt with surrounding whitespace removed; never empty.
    pub prompt: String,
}

impl ChatRequest {
    /// Extract the prompt from an inbound JSON body.
    ///
    /// Returns `None` when `prompt` is missing, not a string, or blank.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let prompt = payload.get("prompt")?.as_str()?.trim();
        if prompt.is_empty() {
            return None;
        }
        Some(Self {
            prompt: prompt.to_string(),
        })
    }
}

/// Successful chat reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    /// Provider-native payload, for diagnostics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Failed chat reply.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Human-readable error category.
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The most specific message available: `details.message`, a string
    /// `details`, or the category itself.
    pub fn message(&self) -> &str {
        match &self.details {
            Some(Value::String(s)) if !s.is_empty() => s,
            Some(details) => details
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or(&self.error),
            None => &self.error,
        }
    }
}

// ─────────────────────────────────────────────
// Health
// ─────────────────────────────────────────────

/// Diagnostics returned by `GET /health`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub ok: bool,
    pub mode: ActiveMode,
    pub model: Option<String>,
    /// RFC 3339 timestamp of the report.
    pub timestamp: String,
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_serialization() {
        assert_eq!(serde_json::to_value(ActiveMode::OpenAi).unwrap(), "openai");
        assert_eq!(serde_json::to_value(ActiveMode::None).unwrap(), "none");
        assert_eq!(ActiveMode::Gemini.to_string(), "gemini");
    }

    #[test]
    fn test_request_trims_prompt() {
        let req = ChatRequest::from_payload(&json!({"prompt": "  hi there \n"})).unwrap();
        assert_eq!(req.prompt, "hi there");
    }

    #[test]
    fn test_request_rejects_invalid_prompts() {
        assert!(ChatRequest::from_payload(&json!({})).is_none());
        assert!(ChatRequest::from_payload(&json!({"prompt": ""})).is_none());
        assert!(ChatRequest::from_payload(&json!({"prompt": " \t\n"})).is_none());
        assert!(ChatRequest::from_payload(&json!({"prompt": 42})).is_none());
        assert!(ChatRequest::from_payload(&json!({"prompt": null})).is_none());
        assert!(ChatRequest::from_payload(&json!("prompt")).is_none());
    }

    #[test]
    fn test_response_omits_missing_raw() {
        let resp = ChatResponse {
            answer: "hello".into(),
            raw: None,
        };
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"answer":"hello"}"#);
    }

    #[test]
    fn test_error_envelope_message() {
        let plain = ErrorEnvelope::new("OpenAI error");
        assert_eq!(plain.message(), "OpenAI error");

        let nested = ErrorEnvelope::new("OpenAI error")
            .with_details(json!({"message": "Rate limit exceeded", "type": "rate_limit"}));
        assert_eq!(nested.message(), "Rate limit exceeded");

        let text = ErrorEnvelope::new("Local model error").with_details(json!("segfault"));
        assert_eq!(text.message(), "segfault");
    }
}
