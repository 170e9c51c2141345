//! Structured adapter failures.
//!
//! Adapters never panic or bubble raw transport errors: every expected failure
//! mode becomes a [`ProviderError`] carrying enough detail for the handler to
//! log and report it without knowing the provider's wire format.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;

/// Failure of a single adapter call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Non-2xx response, or an `error` field in a 2xx body.
    #[error("{provider} returned an error{}: {message}", status_suffix(.status))]
    Upstream {
        provider: &'static str,
        status: Option<u16>,
        message: String,
        /// Parsed provider error body, or the raw text when it was not JSON.
        details: Option<Value>,
    },

    /// The request never produced a response (DNS, connect, TLS, body read).
    #[error("{provider} request failed: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// The outbound call exceeded its time budget.
    #[error("{provider} did not answer within {}s", .after.as_secs())]
    Timeout {
        provider: &'static str,
        after: Duration,
    },

    /// The local model binary exited unsuccessfully.
    #[error("local model exited with {}: {stderr}", exit_label(.code))]
    LocalProcess { code: Option<i32>, stderr: String },

    /// The local model binary could not be started.
    #[error("failed to start local model '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

fn exit_label(code: &Option<i32>) -> String {
    code.map(|c| format!("code {c}"))
        .unwrap_or_else(|| "a signal".to_string())
}

impl ProviderError {
    /// HTTP status reported by the provider, when it sent one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Upstream { status, .. } => *status,
            _ => None,
        }
    }

    /// Whether this failure came from the outbound time budget.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout { .. })
    }

    /// Whether this failure came from the local-process adapter.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ProviderError::LocalProcess { .. } | ProviderError::Spawn { .. }
        )
    }

    /// Name of the provider that failed.
    pub fn provider(&self) -> &'static str {
        match self {
            ProviderError::Upstream { provider, .. }
            | ProviderError::Transport { provider, .. }
            | ProviderError::Timeout { provider, .. } => *provider,
            ProviderError::LocalProcess { .. } | ProviderError::Spawn { .. } => "Local model",
        }
    }

    /// Detail payload for the error envelope.
    pub fn details(&self) -> Value {
        match self {
            ProviderError::Upstream {
                details: Some(details),
                ..
            } => details.clone(),
            ProviderError::Upstream { message, .. } => json!({ "message": message }),
            ProviderError::LocalProcess { stderr, .. } => json!({ "message": stderr }),
            other => json!({ "message": other.to_string() }),
        }
    }
}

/// Map a `reqwest` failure to a timeout or transport error.
pub(crate) fn from_reqwest(
    provider: &'static str,
    timeout: Duration,
    err: reqwest::Error,
) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout {
            provider,
            after: timeout,
        }
    } else {
        ProviderError::Transport {
            provider,
            message: err.to_string(),
        }
    }
}

/// Pull a human-readable message out of a provider error body.
///
/// Handles `{"error": {"message": ..}}`, `{"error": ".."}` and `{"message": ..}`.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    let error = body.get("error").unwrap_or(body);
    error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())
        .map(String::from)
}
