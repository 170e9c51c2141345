//! Playback state machine.
//!
//! ```text
//!            speak              pause
//!   Idle ───────────▶ Speaking ───────▶ Paused
//!    ▲                 │  ▲   ◀───────    │
//!    │  finish / stop  │  │    resume     │ stop / speak
//!    └─────────────────┘  └───────────────┘
//! ```
//!
//! Only one utterance is ever current. Starting a new one cancels the old
//! one first, and completion events for anything but the current utterance
//! are dropped.

use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::{PlaybackEnd, SpeechEngine, SpeechError, Utterance, UtteranceId};
use crate::sanitize::sanitize;
use crate::voice::{choose_voice, Voice};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking => "speaking",
            PlaybackState::Paused => "paused",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: PlaybackState,
    },

    #[error(transparent)]
    Engine(#[from] SpeechError),
}

/// Drives a [`SpeechEngine`] through the playback states.
pub struct PlaybackController<E: SpeechEngine> {
    engine: E,
    state: PlaybackState,
    current: Option<UtteranceId>,
    next_id: u64,
    last_text: Option<String>,
    last_error: Option<String>,
    preferred_voice: Option<String>,
    /// Resolved once per session, and only from a non-empty voice list.
    voice: Option<Voice>,
    rate: f32,
}

impl<E: SpeechEngine> PlaybackController<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            current: None,
            next_id: 0,
            last_text: None,
            last_error: None,
            preferred_voice: None,
            voice: None,
            rate: 1.0,
        }
    }

    pub fn with_voice(mut self, voice: Option<String>) -> Self {
        self.preferred_voice = voice;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current(&self) -> Option<UtteranceId> {
        self.current
    }

    /// Voice chosen for this session, once resolved.
    pub fn voice(&self) -> Option<&Voice> {
        self.voice.as_ref()
    }

    async fn resolve_voice(&mut self) -> Option<String> {
        if self.voice.is_none() {
            match self.engine.voices().await {
                Ok(voices) => {
                    self.voice = choose_voice(&voices, self.preferred_voice.as_deref()).cloned();
                    if let Some(voice) = &self.voice {
                        debug!(voice = %voice.name, lang = %voice.lang, "Selected voice");
                    }
                }
                Err(e) => warn!(error = %e, "Could not list voices"),
            }
        }
        self.voice.as_ref().map(|v| v.name.clone())
    }

    /// Speak `text` after sanitizing it.
    ///
    /// Returns `Ok(None)` when nothing speakable is left. Any utterance in
    /// flight is cancelled before the new one starts.
    pub async fn speak(&mut self, text: &str) -> Result<Option<UtteranceId>, PlaybackError> {
        let text = sanitize(text);
        if text.is_empty() {
            return Ok(None);
        }

        self.cancel_current();
        self.last_text = Some(text.clone());
        self.last_error = None;

        let voice = self.resolve_voice().await;
        self.next_id += 1;
        let id = UtteranceId(self.next_id);

        let utterance = Utterance {
            id,
            text,
            voice,
            rate: self.rate,
        };
        if let Err(e) = self.engine.start(utterance) {
            self.last_error = Some(e.to_string());
            return Err(e.into());
        }

        debug!(id = id.0, "Speaking");
        self.current = Some(id);
        self.state = PlaybackState::Speaking;
        Ok(Some(id))
    }

    /// Speak the last spoken text again.
    pub async fn replay(&mut self) -> Result<Option<UtteranceId>, PlaybackError> {
        match self.last_text.clone() {
            Some(text) => self.speak(&text).await,
            None => Ok(None),
        }
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Speaking {
            return Err(PlaybackError::InvalidTransition {
                action: "pause",
                state: self.state,
            });
        }
        self.engine.pause()?;
        self.state = PlaybackState::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.state != PlaybackState::Paused {
            return Err(PlaybackError::InvalidTransition {
                action: "resume",
                state: self.state,
            });
        }
        self.engine.resume()?;
        self.state = PlaybackState::Speaking;
        Ok(())
    }

    /// Cancel whatever is playing and go idle.
    pub fn stop(&mut self) {
        self.cancel_current();
        self.last_error = None;
    }

    /// Record the end of an utterance.
    ///
    /// Returns the report when `id` is the current utterance, `None` when it
    /// is stale.
    pub fn finish(&mut self, id: UtteranceId, end: PlaybackEnd) -> Option<PlaybackEnd> {
        if self.current != Some(id) {
            debug!(id = id.0, "Ignoring stale playback event");
            return None;
        }
        self.current = None;
        self.state = PlaybackState::Idle;
        if let PlaybackEnd::Errored(message) = &end {
            warn!(id = id.0, error = %message, "Speech failed");
            self.last_error = Some(message.clone());
        }
        Some(end)
    }

    /// Whether pause/resume/clear controls apply right now.
    pub fn controls_enabled(&self) -> bool {
        matches!(self.state, PlaybackState::Speaking | PlaybackState::Paused)
    }

    pub fn status_line(&self) -> &'static str {
        match self.state {
            PlaybackState::Speaking => "Speaking...",
            PlaybackState::Paused => "Paused",
            PlaybackState::Idle if self.last_error.is_some() => "TTS error",
            PlaybackState::Idle => "",
        }
    }

    fn cancel_current(&mut self) {
        if let Some(id) = self.current.take() {
            debug!(id = id.0, "Cancelling utterance");
            self.engine.cancel(id);
        }
        self.state = PlaybackState::Idle;
    }
}
