//! Gemini-style `generateContent` adapter.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use voxrelay_core::config::schema::ProviderConfig;

use crate::error::{from_reqwest, ProviderError};
use crate::http::RawResponse;
use crate::registry::GEMINI;
use crate::traits::{ChatProvider, ProviderReply, RequestOptions};

/// Chat provider for Gemini-style generative language APIs.
///
/// The key travels in the `x-goog-api-key` header so it never appears in the
/// request URL or in logs.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    options: RequestOptions,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(client: reqwest::Client, config: &ProviderConfig, options: RequestOptions) -> Self {
        let api_base = config
            .api_base
            .clone()
            .unwrap_or_else(|| GEMINI.default_api_base.to_string());

        Self {
            client,
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            options,
        }
    }

    fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.model)
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.options.temperature,
                "maxOutputTokens": self.options.max_tokens
            }
        })
    }
}

/// First candidate's first text part, or a top-level `text` field.
fn extract_answer(body: &Value) -> Option<&str> {
    body.pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .or_else(|| body.get("text").and_then(Value::as_str))
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn submit(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let provider = GEMINI.display_name;
        let url = self.generate_url();

        debug!(provider, model = %self.model, url = %url, "Calling LLM");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(self.options.timeout)
            .json(&self.request_body(prompt))
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

        let answer = raw.json.as_ref().and_then(extract_answer);
        if answer.is_none() {
            // Blocked prompts come back with no candidates and a promptFeedback
            warn!(provider, "no candidate text in response");
        }
        Ok(ProviderReply::from_answer(answer, Some(raw.raw())))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn display_name(&self) -> &str {
        GEMINI.display_name
    }

    fn endpoint(&self) -> String {
        self.generate_url()
    }
}
