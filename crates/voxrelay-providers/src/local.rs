//! Local model adapter — runs a llama.cpp-style binary once per prompt.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, warn};

use voxrelay_core::config::schema::{LocalModelConfig, PromptEcho};

use crate::error::ProviderError;
use crate::registry::LOCAL;
use crate::traits::{ChatProvider, ProviderReply, RequestOptions};

/// Chat provider backed by a local model process.
#[derive(Debug)]
pub struct LocalModelProvider {
    binary: String,
    model_path: String,
    prompt_echo: PromptEcho,
    n_predict: u32,
    options: RequestOptions,
}

impl LocalModelProvider {
    pub fn new(config: &LocalModelConfig, options: RequestOptions) -> Self {
        Self {
            binary: config.binary.clone(),
            model_path: config.model_path.clone(),
            prompt_echo: config.prompt_echo,
            n_predict: config.n_predict,
            options,
        }
    }

    /// Command-line arguments for one generation.
    fn args(&self, prompt: &str) -> Vec<String> {
        let mut args = vec![
            "-m".to_string(),
            self.model_path.clone(),
            "-p".to_string(),
            prompt.to_string(),
            "--temp".to_string(),
            self.options.temperature.to_string(),
            "-n".to_string(),
            self.n_predict.to_string(),
        ];
        if self.prompt_echo == PromptEcho::Suppress {
            args.push("--no-display-prompt".to_string());
        }
        args
    }

    /// Run the binary and collect `(status, stdout, stderr)`.
    async fn run(
        &self,
        prompt: &str,
    ) -> Result<(std::process::ExitStatus, String, String), ProviderError> {
        let mut child = Command::new(&self.binary)
            .args(self.args(prompt))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| {
                error!(binary = %self.binary, error = %source, "Failed to spawn local model");
                ProviderError::Spawn {
                    binary: self.binary.clone(),
                    source,
                }
            })?;

        let mut stdout = drain(child.stdout.take());
        let mut stderr = drain(child.stderr.take());

        // One deadline covers the exit and both pipes: a backgrounded
        // grandchild can hold the pipes open after the binary exits.
        let finished = timeout(self.options.timeout, async {
            let status = child.wait().await?;
            let out = (&mut stdout).await.unwrap_or_default();
            let err = (&mut stderr).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, out, err))
        })
        .await;

        match finished {
            Ok(Ok((status, out, err))) => Ok((status, lossy(&out), lossy(&err))),
            Ok(Err(e)) => Err(ProviderError::Spawn {
                binary: self.binary.clone(),
                source: e,
            }),
            Err(_) => {
                warn!(binary = %self.binary, "Local model timed out, killing it");
                if let Ok(None) = child.try_wait() {
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to kill local model");
                    }
                }
                stdout.abort();
                stderr.abort();
                Err(ProviderError::Timeout {
                    provider: LOCAL.display_name,
                    after: self.options.timeout,
                })
            }
        }
    }
}

/// Read a child pipe to the end on its own task.
fn drain<R>(pipe: Option<R>) -> JoinHandle<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            if let Err(e) = pipe.read_to_end(&mut buf).await {
                debug!(error = %e, "Local model pipe closed early");
            }
        }
        buf
    })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Remove an echoed prompt from the head of the output.
///
/// Only a leading echo is removed; a prompt repeated later in the generation
/// is left alone.
pub fn strip_prompt_echo(output: &str, prompt: &str) -> String {
    let output = output.trim();
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return output.to_string();
    }
    output
        .strip_prefix(prompt)
        .unwrap_or(output)
        .trim()
        .to_string()
}

#[async_trait]
impl ChatProvider for LocalModelProvider {
    async fn submit(&self, prompt: &str) -> Result<ProviderReply, ProviderError> {
        debug!(binary = %self.binary, model = %self.model_path, "Running local model");

        let (status, stdout, stderr) = self.run(prompt).await?;

        if !status.success() {
            let stderr = stderr.trim().to_string();
            error!(code = ?status.code(), stderr = %stderr, "Local model failed");
            return Err(ProviderError::LocalProcess {
                code: status.code(),
                stderr,
            });
        }

        let answer = match self.prompt_echo {
            PromptEcho::Strip => strip_prompt_echo(&stdout, prompt),
            PromptEcho::Suppress => stdout.trim().to_string(),
        };
        Ok(ProviderReply::from_answer(Some(&answer), None))
    }

    fn model(&self) -> &str {
        &self.model_path
    }

    fn display_name(&self) -> &str {
        LOCAL.display_name
    }

    fn endpoint(&self) -> String {
        self.binary.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::NO_RESPONSE;

    #[test]
    fn test_strip_prompt_echo_head() {
        assert_eq!(strip_prompt_echo("PROMPT_TEXThello", "PROMPT_TEXT"), "hello");
        assert_eq!(strip_prompt_echo("  hi there\n the answer ", "hi there"), "the answer");
    }

    #[test]
    fn test_strip_prompt_echo_only_at_head() {
        assert_eq!(
            strip_prompt_echo("answer mentions ping twice: ping", "ping"),
            "answer mentions ping twice: ping"
        );
    }

    #[test]
    fn test_args_include_sampling() {
        let provider = LocalModelProvider::new(&LocalModelConfig::default(), RequestOptions::default());
        let args = provider.args("hello");
        assert_eq!(
            args,
            vec!["-m", "./models/ggml-model-q4_0.bin", "-p", "hello", "--temp", "0.7", "-n", "256"]
        );
    }

    #[test]
    fn test_args_suppress_echo() {
        let config = LocalModelConfig {
            prompt_echo: PromptEcho::Suppress,
            ..LocalModelConfig::default()
        };
        let provider = LocalModelProvider::new(&config, RequestOptions::default());
        assert_eq!(provider.args("x").last().map(String::as_str), Some("--no-display-prompt"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let config = LocalModelConfig {
            binary: "/nonexistent/voxrelay-llama".into(),
            ..LocalModelConfig::default()
        };
        let err = LocalModelProvider::new(&config, RequestOptions::default())
            .submit("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
        assert!(err.is_local());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use std::time::Duration;

        /// Write an executable shell script standing in for the model binary.
        fn fake_binary(dir: &tempfile::TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("llama");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn provider_for(path: &PathBuf, options: RequestOptions) -> LocalModelProvider {
            let config = LocalModelConfig {
                binary: path.display().to_string(),
                ..LocalModelConfig::default()
            };
            LocalModelProvider::new(&config, options)
        }

        #[tokio::test]
        async fn test_echo_is_stripped() {
            let dir = tempfile::tempdir().unwrap();
            // $4 is the prompt after `-m <path> -p`
            let bin = fake_binary(&dir, r#"printf '%s and the rest' "$4""#);
            let reply = provider_for(&bin, RequestOptions::default())
                .submit("Tell me a joke")
                .await
                .unwrap();
            assert_eq!(reply.answer, "and the rest");
            assert!(reply.raw.is_none());
        }

        #[tokio::test]
        async fn test_non_zero_exit_carries_stderr() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_binary(&dir, "echo 'model file missing' >&2\nexit 3");
            let err = provider_for(&bin, RequestOptions::default())
                .submit("hi")
                .await
                .unwrap_err();
            match err {
                ProviderError::LocalProcess { code, stderr } => {
                    assert_eq!(code, Some(3));
                    assert_eq!(stderr, "model file missing");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_empty_output_is_no_response() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_binary(&dir, r#"printf '%s' "$4""#);
            let reply = provider_for(&bin, RequestOptions::default())
                .submit("only echo")
                .await
                .unwrap();
            assert_eq!(reply.answer, NO_RESPONSE);
        }

        #[tokio::test]
        async fn test_timeout_kills_child() {
            let dir = tempfile::tempdir().unwrap();
            let bin = fake_binary(&dir, "exec sleep 5");
            let options = RequestOptions {
                timeout: Duration::from_millis(200),
                ..RequestOptions::default()
            };
            let started = std::time::Instant::now();
            let err = provider_for(&bin, options).submit("hi").await.unwrap_err();
            assert!(err.is_timeout());
            assert!(started.elapsed() < Duration::from_secs(4));
        }

        #[tokio::test]
        async fn test_timeout_covers_held_pipes() {
            let dir = tempfile::tempdir().unwrap();
            // The binary exits at once but a background child keeps stdout open
            let bin = fake_binary(&dir, "sleep 4 &\nprintf 'answer'\nexit 0");
            let options = RequestOptions {
                timeout: Duration::from_millis(300),
                ..RequestOptions::default()
            };
            let started = std::time::Instant::now();
            let err = provider_for(&bin, options).submit("hi").await.unwrap_err();
            assert!(err.is_timeout());
            assert!(started.elapsed() < Duration::from_secs(2));
        }
    }
}
