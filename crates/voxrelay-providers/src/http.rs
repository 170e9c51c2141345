//! Response handling shared by the HTTP adapters.
//!
//! Bodies are read as text first and parsed opportunistically, so a provider
//! that answers with HTML or truncated JSON still yields a diagnosable error.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use voxrelay_core::utils::truncate_string;

use crate::error::{error_message, from_reqwest, ProviderError};

/// Response bodies are cut to this many characters in logs.
pub(crate) const LOG_BODY_CHARS: usize = 500;

/// A fully read HTTP response.
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub text: String,
    /// `None` when the body is not valid JSON.
    pub json: Option<Value>,
}

impl RawResponse {
    /// Read the body of `response` within the request's time budget.
    pub async fn read(
        provider: &'static str,
        timeout: Duration,
        response: reqwest::Response,
    ) -> Result<Self, ProviderError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| from_reqwest(provider, timeout, e))?;

        debug!(
            provider,
            status = %status,
            body = %truncate_string(&text, LOG_BODY_CHARS),
            "provider response received"
        );

        let json = serde_json::from_str(&text).ok();
        Ok(Self { status, text, json })
    }

    /// Provider-native payload: the parsed body, or the raw text when it was
    /// not JSON.
    pub fn raw(&self) -> Value {
        self.json
            .clone()
            .unwrap_or_else(|| Value::String(self.text.clone()))
    }

    /// Classify the response as an upstream error, if it is one.
    ///
    /// Non-2xx statuses and 2xx bodies with a non-null `error` field both count.
    pub fn upstream_error(&self, provider: &'static str) -> Option<ProviderError> {
        let reported = self
            .json
            .as_ref()
            .and_then(|body| body.get("error"))
            .filter(|e| !e.is_null());

        if self.status.is_success() && reported.is_none() {
            return None;
        }

        let message = self
            .json
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| {
                if self.text.trim().is_empty() {
                    self.status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                } else {
                    truncate_string(self.text.trim(), LOG_BODY_CHARS)
                }
            });

        let status = (!self.status.is_success()).then(|| self.status.as_u16());

        error!(provider, status = ?status, message = %message, "provider reported an error");

        Some(ProviderError::Upstream {
            provider,
            status,
            message,
            details: Some(reported.cloned().unwrap_or_else(|| self.raw())),
        })
    }
}
