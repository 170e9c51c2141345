//! OpenAI-style chat completion adapter.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint with a single
//! user message per call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use voxrelay_core::config::schema::ProviderConfig;

use crate::error::{from_reqwest, ProviderError};
use crate::http::RawResponse;
use crate::registry::OPENAI;
use crate::traits::{ChatProvider, ProviderReply, RequestOptions};

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [UserMessage<'a>; 1],
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    /// Legacy completions field.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// First choice's message content, or its legacy `text` field.
fn extract_answer(body: &Value) -> Option<String> {
    let parsed: CompletionResponse = serde_json::from_value(body.clone()).ok()?;
    let choice = parsed.choices.into_iter().next()?;
    choice.message.and_then(|m| m.content).or(choice.text)
}

// ─────────────────────────────────────────────
// OpenAiProvider
// ─────────────────────────────────────────────

/// Chat provider for OpenAI-compatible APIs.
pub struct OpenAiProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL (e.g. `"https://api.openai.com/v1"`).
    api_base: String,
    /// API key for Bearer authentication.
    api_key: String,
    model: String,
    options: RequestOptions,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    /// Create a provider from its config; `api_base` falls back to the
    /// registry default.
    pub fn new(client: reqwest::Client, config: &ProviderConfig, options: RequestOptions) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| OPENAI.default_api_base.to_string());

        Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            options,
        }
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/chat/completions", base)
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn submit(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let provider = OPENAI.display_name;
        let url = self.completions_url();

        debug!(provider, model = %self.model, url = %url, "Calling LLM");

        let body = CompletionRequest {
            model: &self.model,
            messages: [UserMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.options.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider, error = %e, "HTTP request failed");
                from_reqwest(provider, self.options.timeout, e)
            })?;

        let raw = RawResponse::read(provider, self.options.timeout, response).await?;
        if let Some(err) = raw.upstream_error(provider) {
            return Err(err);
        }

        let Some(json) = raw.json.as_ref() else {
            warn!(provider, "response body is not JSON");
            return Ok(ProviderReply::from_answer(None, Some(raw.raw())));
        };

        let answer = extract_answer(json);
        if answer.is_none() {
            warn!(provider, "no completion choice in response");
        }
        Ok(ProviderReply::from_answer(answer.as_deref(), Some(raw.raw())))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        OPENAI.display_name
    }

    fn endpoint(&self) -> String {
        self.completions_url()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NO_RESPONSE;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_provider(api_key: &str, api_base: Option<&str>) -> OpenAiProvider {
        let config = ProviderConfig {
            api_key: api_key.to_string(),
            api_base: api_base.map(String::from),
            model: "gpt-4o-mini".to_string(),
        };
        OpenAiProvider::new(reqwest::Client::new(), &config, RequestOptions::default())
    }

    // ── Unit tests ──

    #[test]
    fn test_completions_url_trailing_slash() {
        let provider = make_provider("key", Some("https://api.openai.com/v1/"));
        assert_eq!(
            provider.completions_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_default_api_base() {
        let provider = make_provider("key", None);
        assert_eq!(provider.api_base, "https://api.openai.com/v1");
    }

    #[test]
    fn test_debug_hides_key() {
        let provider = make_provider("sk-secret-123", None);
        assert!(!format!("{provider:?}").contains("sk-secret-123"));
        assert!(!provider.endpoint().contains("sk-secret-123"));
    }

    #[test]
    fn test_extract_answer_legacy_text() {
        let body = serde_json::json!({"choices": [{"text": "legacy"}]});
        assert_eq!(extract_answer(&body).as_deref(), Some("legacy"));
    }

    #[test]
    fn test_extract_answer_malformed() {
        assert_eq!(extract_answer(&serde_json::json!({"choices": "nope"})), None);
        assert_eq!(extract_answer(&serde_json::json!({"choices": []})), None);
    }

    // ── Integration tests with mock server ──

    #[tokio::test]
    async fn test_submit_success_trims_first_choice() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-test",
                "choices": [
                    { "message": { "content": "  Hello from the relay!\n" }, "finish_reason": "stop" },
                    { "message": { "content": "second choice" }, "finish_reason": "stop" }
                ]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = make_provider("test-key-123", Some(&mock_server.uri()));
        let reply = provider.submit("Hello").await.unwrap();

        assert_eq!(reply.answer, "Hello from the relay!");
        assert_eq!(reply.raw.unwrap()["id"], "chatcmpl-test");
    }

    #[tokio::test]
    async fn test_submit_sends_correct_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "messages": [{ "role": "user", "content": "test prompt" }],
                "temperature": 0.7,
                "max_tokens": 512
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "ok" } }]
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider("key", Some(&mock_server.uri()));
        let reply = provider.submit("test prompt").await.unwrap();

        // If the body matcher fails, wiremock returns 404 → we'd get an error
        assert_eq!(reply.answer, "ok");
    }

    #[tokio::test]
    async fn test_submit_api_error_keeps_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {
                    "message": "Rate limit exceeded",
                    "type": "rate_limit_error"
                }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider("key", Some(&mock_server.uri()));
        let err = provider.submit("Hello").await.unwrap_err();

        assert_eq!(err.status(), Some(429));
        assert_eq!(err.details()["message"], "Rate limit exceeded");
        assert_eq!(err.details()["type"], "rate_limit_error");
    }

    #[tokio::test]
    async fn test_submit_error_field_in_ok_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "error": { "message": "Incorrect API key provided", "code": "invalid_api_key" }
            })))
            .mount(&mock_server)
            .await;

        let provider = make_provider("bad", Some(&mock_server.uri()));
        let err = provider.submit("Hello").await.unwrap_err();

        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("Incorrect API key provided"));
        assert_eq!(err.details()["code"], "invalid_api_key");
    }

    #[tokio::test]
    async fn test_submit_malformed_body_degrades() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let provider = make_provider("key", Some(&mock_server.uri()));
        let reply = provider.submit("Hello").await.unwrap();

        assert_eq!(reply.answer, NO_RESPONSE);
        assert_eq!(reply.raw, Some(Value::String("<html>oops</html>".into())));
    }

    #[tokio::test]
    async fn test_submit_timeout() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"choices": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let config = ProviderConfig {
            api_key: "key".into(),
            api_base: Some(mock_server.uri()),
            model: "gpt-4o-mini".into(),
        };
        let options = RequestOptions {
            timeout: Duration::from_millis(200),
            ..RequestOptions::default()
        };
        let provider = OpenAiProvider::new(reqwest::Client::new(), &config, options);

        let err = provider.submit("Hello").await.unwrap_err();
        assert!(err.is_timeout(), "expected timeout, got {err:?}");
    }

    #[tokio::test]
    async fn test_submit_network_error() {
        // Point to a port that's not listening
        let provider = make_provider("key", Some("http://127.0.0.1:1"));
        let err = provider.submit("Hello").await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));
    }
}
