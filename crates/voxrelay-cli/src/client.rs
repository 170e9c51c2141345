//! HTTP client for a running relay — what the browser page does, from a terminal.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use thiserror::Error;

use voxrelay_core::{ChatResponse, ErrorEnvelope, HealthReport};

#[derive(Error, Debug)]
pub enum ClientError {
    /// The relay answered with an error envelope.
    #[error("{}", .envelope.message())]
    Api {
        status: StatusCode,
        envelope: ErrorEnvelope,
    },

    #[error("relay unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct RelayClient {
    base_url: String,
    http: reqwest::Client,
}

impl RelayClient {
    /// `timeout` bounds each call; it should exceed the relay's own
    /// provider timeout so the relay's 504 arrives first.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn chat(&self, prompt: &str) -> Result<ChatResponse, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(&json!({ "prompt": prompt }))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Non-JSON error pages still produce an envelope
        let text = response.text().await.unwrap_or_default();
        let envelope = serde_json::from_str::<ErrorEnvelope>(&text).unwrap_or_else(|_| {
            ErrorEnvelope::new(
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string(),
            )
        });
        Err(ClientError::Api { status, envelope })
    }

    pub async fn health(&self) -> Result<HealthReport, ClientError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str) -> RelayClient {
        RelayClient::new(uri, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn chat_returns_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_json(json!({"prompt": "hi"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "hello"})))
            .mount(&server)
            .await;

        let reply = client(&format!("{}/", server.uri())).chat("hi").await.unwrap();
        assert_eq!(reply.answer, "hello");
        assert!(reply.raw.is_none());
    }

    #[tokio::test]
    async fn chat_error_prefers_details_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": "OpenAI error",
                "details": {"message": "Rate limit exceeded"}
            })))
            .mount(&server)
            .await;

        let err = client(&server.uri()).chat("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Rate limit exceeded");
        match err {
            ClientError::Api { status, envelope } => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(envelope.error, "OpenAI error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn chat_error_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let err = client(&server.uri()).chat("hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Bad Gateway");
    }

    #[tokio::test]
    async fn health_parses_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "mode": "gemini", "model": "gemini-1.5-flash",
                "timestamp": "2026-01-01T00:00:00+00:00"
            })))
            .mount(&server)
            .await;

        let report = client(&server.uri()).health().await.unwrap();
        assert_eq!(report.mode, voxrelay_core::ActiveMode::Gemini);
        assert_eq!(report.model.as_deref(), Some("gemini-1.5-flash"));
    }
}
