//! Speech engines — the platform side of playback.
//!
//! [`SpeechEngine`] is what the playback controller drives. [`CommandSpeech`]
//! implements it on top of a TTS command (`espeak`, `espeak-ng` or `say`),
//! one child process per utterance.

use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use voxrelay_core::config::schema::SpeechConfig;

use crate::voice::{parse_espeak_voices, parse_say_voices, Voice};

/// Words per minute both `espeak` and `say` use at rate 1.0.
const BASE_WPM: f32 = 175.0;

// ─────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────

/// Identifier of one utterance; never reused within a controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

/// One piece of text handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub voice: Option<String>,
    /// Relative speaking rate, 1.0 being the engine default.
    pub rate: f32,
}

/// How an utterance ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaybackEnd {
    Ended,
    Errored(String),
}

/// Completion report sent by an engine.
pub type PlaybackEvent = (UtteranceId, PlaybackEnd);

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to signal speech process: {0}")]
    Signal(String),

    #[error("{0}")]
    Unsupported(&'static str),
}

// ─────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────

/// Trait that speech backends implement.
///
/// `start` returns as soon as speech has begun; the end of the utterance is
/// reported asynchronously as a [`PlaybackEvent`].
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Voices the engine can speak with.
    async fn voices(&self) -> Result<Vec<Voice>, SpeechError>;

    fn start(&self, utterance: Utterance) -> Result<(), SpeechError>;

    /// Stop `id` if it is still playing. No completion is reported for it.
    fn cancel(&self, id: UtteranceId);

    fn pause(&self) -> Result<(), SpeechError>;

    fn resume(&self) -> Result<(), SpeechError>;
}

// ─────────────────────────────────────────────
// CommandSpeech
// ─────────────────────────────────────────────

struct Active {
    id: UtteranceId,
    pid: Option<u32>,
    cancel: oneshot::Sender<()>,
}

/// Speech through a platform TTS command.
pub struct CommandSpeech {
    command: String,
    events: mpsc::UnboundedSender<PlaybackEvent>,
    active: Arc<Mutex<Option<Active>>>,
}

impl CommandSpeech {
    /// Create an engine and the receiver its completion events arrive on.
    pub fn new(command: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let engine = Self {
            command: command.into(),
            events,
            active: Arc::new(Mutex::new(None)),
        };
        (engine, rx)
    }

    pub fn from_config(config: &SpeechConfig) -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        Self::new(config.command.clone())
    }

    fn is_say(&self) -> bool {
        std::path::Path::new(&self.command)
            .file_name()
            .is_some_and(|name| name == "say")
    }

    /// Arguments for speaking `utterance`.
    fn args(&self, utterance: &Utterance) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        let wpm = (BASE_WPM * utterance.rate).round().max(1.0) as u32;
        args.push(if self.is_say() { "-r" } else { "-s" }.to_string());
        args.push(wpm.to_string());
        args.push(utterance.text.clone());
        args
    }

    fn active_pid(&self) -> Option<u32> {
        self.active
            .lock()
            .ok()
            .and_then(|active| active.as_ref().and_then(|a| a.pid))
    }

    #[cfg(unix)]
    fn signal(&self, signal: nix::sys::signal::Signal) -> Result<(), SpeechError> {
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Some(pid) = self.active_pid() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).map_err(|e| SpeechError::Signal(e.to_string()))?;
        kill(Pid::from_raw(pid), signal).map_err(|e| SpeechError::Signal(e.to_string()))
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeech {
    async fn voices(&self) -> Result<Vec<Voice>, SpeechError> {
        let list_args: &[&str] = if self.is_say() { &["-v", "?"] } else { &["--voices"] };
        let output = Command::new(&self.command)
            .args(list_args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|source| SpeechError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let voices = if self.is_say() {
            parse_say_voices(&stdout)
        } else {
            parse_espeak_voices(&stdout)
        };
        debug!(command = %self.command, count = voices.len(), "Listed voices");
        Ok(voices)
    }

    fn start(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let mut child = Command::new(&self.command)
            .args(self.args(&utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpeechError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let id = utterance.id;
        let (cancel_tx, mut cancel_rx) = oneshot::channel();
        let previous = self.active.lock().ok().and_then(|mut active| {
            active.replace(Active {
                id,
                pid: child.id(),
                cancel: cancel_tx,
            })
        });
        if let Some(previous) = previous {
            let _ = previous.cancel.send(());
        }

        let events = self.events.clone();
        let active = Arc::clone(&self.active);
        let command = self.command.clone();

        tokio::spawn(async move {
            let end = tokio::select! {
                status = child.wait() => match status {
                    Ok(status) if status.success() => PlaybackEnd::Ended,
                    Ok(status) => PlaybackEnd::Errored(format!("{command} exited with {status}")),
                    Err(e) => PlaybackEnd::Errored(e.to_string()),
                },
                Ok(()) = &mut cancel_rx => {
                    if let Err(e) = child.kill().await {
                        warn!(error = %e, "Failed to stop speech process");
                    }
                    debug!(id = id.0, "Utterance cancelled");
                    return;
                }
            };

            if let Ok(mut slot) = active.lock() {
                if slot.as_ref().is_some_and(|a| a.id == id) {
                    slot.take();
                }
            }
            let _ = events.send((id, end));
        });

        Ok(())
    }

    fn cancel(&self, id: UtteranceId) {
        let active = self.active.lock().ok().and_then(|mut slot| {
            if slot.as_ref().is_some_and(|a| a.id == id) {
                slot.take()
            } else {
                None
            }
        });
        if let Some(active) = active {
            // Continue a paused child so the kill and reap below complete
            #[cfg(unix)]
            if let Some(pid) = active.pid.and_then(|p| i32::try_from(p).ok()) {
                let _ = nix::sys::signal::kill(
                    nix::unistd::Pid::from_raw(pid),
                    nix::sys::signal::Signal::SIGCONT,
                );
            }
            let _ = active.cancel.send(());
        }
    }

    #[cfg(unix)]
    fn pause(&self) -> Result<(), SpeechError> {
        self.signal(nix::sys::signal::Signal::SIGSTOP)
    }

    #[cfg(unix)]
    fn resume(&self) -> Result<(), SpeechError> {
        self.signal(nix::sys::signal::Signal::SIGCONT)
    }

    #[cfg(not(unix))]
    fn pause(&self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported("pause is not supported on this platform"))
    }

    #[cfg(not(unix))]
    fn resume(&self) -> Result<(), SpeechError> {
        Err(SpeechError::Unsupported("resume is not supported on this platform"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utterance(id: u64, text: &str) -> Utterance {
        Utterance {
            id: UtteranceId(id),
            text: text.to_string(),
            voice: None,
            rate: 1.0,
        }
    }

    #[test]
    fn test_espeak_args() {
        let (engine, _rx) = CommandSpeech::new("espeak");
        let mut utt = utterance(1, "hello");
        utt.voice = Some("en-gb".into());
        utt.rate = 1.2;
        assert_eq!(engine.args(&utt), vec!["-v", "en-gb", "-s", "210", "hello"]);
    }

    #[test]
    fn test_say_args() {
        let (engine, _rx) = CommandSpeech::new("/usr/bin/say");
        assert_eq!(engine.args(&utterance(1, "hi")), vec!["-r", "175", "hi"]);
    }

    #[tokio::test]
    async fn test_missing_command_fails_to_start() {
        let (engine, _rx) = CommandSpeech::new("/nonexistent/voxrelay-tts");
        let err = engine.start(utterance(1, "hi")).unwrap_err();
        assert!(matches!(err, SpeechError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        fn fake_tts(dir: &tempfile::TempDir, body: &str) -> String {
            let path = dir.path().join("espeak");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.display().to_string()
        }

        #[tokio::test]
        async fn test_completion_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let (engine, mut rx) = CommandSpeech::new(fake_tts(&dir, "exit 0"));
            engine.start(utterance(7, "hi")).unwrap();

            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(event, (UtteranceId(7), PlaybackEnd::Ended));
        }

        #[tokio::test]
        async fn test_failure_is_reported() {
            let dir = tempfile::tempdir().unwrap();
            let (engine, mut rx) = CommandSpeech::new(fake_tts(&dir, "exit 1"));
            engine.start(utterance(2, "hi")).unwrap();

            let (id, end) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(id, UtteranceId(2));
            assert!(matches!(end, PlaybackEnd::Errored(_)));
        }

        #[tokio::test]
        async fn test_cancelled_utterance_reports_nothing() {
            let dir = tempfile::tempdir().unwrap();
            let (engine, mut rx) = CommandSpeech::new(fake_tts(&dir, "exec sleep 5"));
            engine.start(utterance(1, "long")).unwrap();
            engine.pause().unwrap();
            engine.cancel(UtteranceId(1));

            let waited = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
            assert!(waited.is_err(), "cancelled utterance must not report");
        }

        #[tokio::test]
        async fn test_voices_from_espeak_listing() {
            let dir = tempfile::tempdir().unwrap();
            let script = "echo 'Pty Language Age/Gender VoiceName File Other'\n\
                          echo ' 5  en-gb  --/M  English gmw/en'";
            let (engine, _rx) = CommandSpeech::new(fake_tts(&dir, script));
            let voices = engine.voices().await.unwrap();
            assert_eq!(voices, vec![Voice::new("English", "en-gb")]);
        }
    }
}
