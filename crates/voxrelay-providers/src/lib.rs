//! Provider layer for voxrelay.
//!
//! # Architecture
//!
//! - [`traits::ChatProvider`] — uniform prompt → answer contract
//! - [`openai`], [`gemini`], [`local`] — the three chat backends
//! - [`registry`] — static specs, [`create_provider`] and the [`ProviderFactory`] seam
//! - [`tts`] — server-side streaming speech synthesis

pub mod error;
pub mod gemini;
mod http;
pub mod local;
pub mod openai;
pub mod registry;
pub mod traits;
pub mod tts;

// Re-export main types for convenience
pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use local::LocalModelProvider;
pub use openai::OpenAiProvider;
pub use registry::{create_provider, DefaultProviderFactory, ProviderFactory, ProviderSpec, PROVIDERS};
pub use traits::{ChatProvider, ProviderReply, RequestOptions, NO_RESPONSE};
pub use tts::{ElevenLabsSpeech, SpeechSynthesizer, TtsError};
