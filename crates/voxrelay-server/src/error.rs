//! Chat failures and their HTTP envelopes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use voxrelay_core::ErrorEnvelope;
use voxrelay_providers::ProviderError;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("missing or empty prompt")]
    InvalidInput,

    #[error("no provider configured")]
    Unconfigured,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ChatError {
    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::InvalidInput => StatusCode::BAD_REQUEST,
            ChatError::Unconfigured | ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ChatError::Provider(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ChatError::Provider(e) => mirrored_status(e.status()),
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        match self {
            ChatError::InvalidInput => ErrorEnvelope::new("Missing prompt"),
            ChatError::Unconfigured => ErrorEnvelope::new("No provider configured").with_details(
                json!({ "message": "Set OPENAI_API_KEY or GEMINI_API_KEY" }),
            ),
            ChatError::Provider(e) if e.is_timeout() => {
                ErrorEnvelope::new("Provider timeout").with_details(e.details())
            }
            ChatError::Provider(e) if e.is_local() => {
                ErrorEnvelope::new("Local model error").with_details(e.details())
            }
            ChatError::Provider(e) => {
                ErrorEnvelope::new(format!("{} error", e.provider())).with_details(e.details())
            }
            ChatError::Internal(_) => ErrorEnvelope::new("Server error"),
        }
    }
}

/// Pass a provider's 4xx/5xx through; anything else becomes 500.
fn mirrored_status(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        if let ChatError::Internal(e) = &self {
            error!(error = %format!("{e:#}"), "Chat handler failed");
        }
        (self.status(), Json(self.envelope())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn upstream(provider: &'static str, status: Option<u16>) -> ChatError {
        ChatError::Provider(ProviderError::Upstream {
            provider,
            status,
            message: "boom".into(),
            details: Some(json!({"message": "boom"})),
        })
    }

    #[test]
    fn test_invalid_input() {
        let err = ChatError::InvalidInput;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.envelope().error, "Missing prompt");
    }

    #[test]
    fn test_upstream_status_mirrored() {
        let err = upstream("OpenAI", Some(429));
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.envelope().error, "OpenAI error");
        assert_eq!(err.envelope().message(), "boom");
    }

    #[test]
    fn test_non_error_status_becomes_500() {
        assert_eq!(upstream("Gemini", None).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream("Gemini", Some(302)).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream("Gemini", Some(200)).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(upstream("Gemini", None).envelope().error, "Gemini error");
    }

    #[test]
    fn test_timeout_is_504() {
        let err = ChatError::Provider(ProviderError::Timeout {
            provider: "OpenAI",
            after: Duration::from_secs(60),
        });
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.envelope().error, "Provider timeout");
    }

    #[test]
    fn test_local_failure() {
        let err = ChatError::Provider(ProviderError::LocalProcess {
            code: Some(1),
            stderr: "no model".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let envelope = err.envelope();
        assert_eq!(envelope.error, "Local model error");
        assert_eq!(envelope.message(), "no model");
    }

    #[test]
    fn test_internal_hides_detail() {
        let err = ChatError::Internal(anyhow::anyhow!("secret path /etc/x"));
        let envelope = err.envelope();
        assert_eq!(envelope.error, "Server error");
        assert!(envelope.details.is_none());
    }
}
