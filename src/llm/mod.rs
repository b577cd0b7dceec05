//! Language backend abstraction
//!
//! The companion only needs prompt-in, text-out generation. Backends must
//! report quota exhaustion as a distinct error so the caller can wait and
//! retry it, while every other failure ends the turn.

mod gemini;
mod retry;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiBackend, classify_error};
pub use retry::{BackendReply, CallError, RetryPolicy, call_with_retry};

/// Errors a language backend can report
#[derive(Debug, Error)]
pub enum BackendError {
    /// Rate limit or usage quota hit; worth retrying after a pause
    #[error("quota exhausted: {0}")]
    QuotaExhausted(String),

    /// Credentials rejected
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Any other error response from the API
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the response body
        message: String,
    },

    /// Request never completed
    #[error("transport error: {0}")]
    Transport(String),

    /// Response carried no text
    #[error("empty reply")]
    EmptyReply,
}

impl BackendError {
    /// Whether the caller should wait and try again
    #[must_use]
    pub const fn is_quota_exhausted(&self) -> bool {
        matches!(self, Self::QuotaExhausted(_))
    }
}

/// Text-generation backend
#[async_trait]
pub trait LanguageBackend: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    /// Generate a completion for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}
