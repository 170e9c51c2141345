//! Client-side speech for voxrelay: Markdown sanitizing, voice selection,
//! and a playback state machine over a platform TTS command.

pub mod engine;
pub mod playback;
pub mod sanitize;
pub mod voice;

pub use engine::{CommandSpeech, PlaybackEnd, PlaybackEvent, SpeechEngine, SpeechError, Utterance, UtteranceId};
pub use playback::{PlaybackController, PlaybackError, PlaybackState};
pub use sanitize::sanitize;
pub use voice::{choose_voice, Voice};
