//! Ambient Companion - proactive voice companion for a monitored home
//!
//! This library drives a turn-based conversation between the occupant of a
//! home and a generative-language backend:
//! - Speech capture and transcription via the home's speech web service
//! - Reactive replies to fresh speech, proactive suggestions on silence
//! - Bounded, fixed-delay retries on backend quota exhaustion
//! - Replies handed back to the speech service for text-to-speech
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Speech web service (HTTP)              │
//! │   check-interaction  │  transcribe  │  respuesta    │
//! └──────────┬──────────────────────────────▲───────────┘
//!            │                              │
//! ┌──────────▼──────────────────────────────┴───────────┐
//! │                     Session                         │
//! │  Poller → Composer → Retry caller → Disseminator    │
//! │                 (conversation history)              │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Language backend (Gemini)              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod session;
pub mod voice;

pub use config::Config;
pub use context::{ContextProfile, ConversationHistory, PromptComposer, Role, Utterance};
pub use error::{Error, Result};
pub use llm::{
    BackendError, BackendReply, CallError, GeminiBackend, LanguageBackend, RetryPolicy,
    call_with_retry,
};
pub use session::{Session, SessionConfig, SessionReport, TurnMode, TurnOutcome, TurnResult};
pub use voice::{
    HttpSpeechCapture, HttpSpeechDelivery, PollResult, SpeechSink, SpeechSource,
    TranscriptFilter, TranscriptionPoller,
};
