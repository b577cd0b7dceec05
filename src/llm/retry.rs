//! Bounded retry for language backend calls
//!
//! Only quota exhaustion is retried, after a fixed pause that stays the same
//! for every attempt.

use std::time::Duration;

use thiserror::Error;

use super::{BackendError, LanguageBackend};

/// Retry policy for backend calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first
    pub max_attempts: u32,
    /// Pause after each quota-exhausted attempt
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            retry_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Create a policy; at least one attempt is always made
    #[must_use]
    pub fn new(max_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            retry_delay,
        }
    }
}

/// A successful backend completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    /// Trimmed completion text, annotation included
    ///
    /// History records it as is; the disseminator strips the annotation
    /// before speaking.
    pub raw: String,
    /// Attempts it took to get this reply
    pub attempts: u32,
}

impl BackendReply {
    fn new(text: &str, attempts: u32) -> Self {
        Self {
            raw: text.trim().to_string(),
            attempts,
        }
    }
}

/// Why a backend call produced no reply
#[derive(Debug, Error)]
pub enum CallError {
    /// Every allowed attempt hit the quota
    #[error("no reply after {attempts} quota-exhausted attempts")]
    Exhausted {
        /// Attempts made
        attempts: u32,
    },

    /// A non-retryable backend failure
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Call `backend`, retrying quota exhaustion per `policy`
///
/// # Errors
///
/// Returns `CallError::Exhausted` once `max_attempts` quota-exhausted
/// attempts have been made, or `CallError::Backend` on the first failure of
/// any other kind.
pub async fn call_with_retry(
    backend: &dyn LanguageBackend,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<BackendReply, CallError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match backend.generate(prompt).await {
            Ok(text) if text.trim().is_empty() => {
                return Err(CallError::Backend(BackendError::EmptyReply));
            }
            Ok(text) => {
                let reply = BackendReply::new(&text, attempts);
                tracing::info!(
                    backend = backend.name(),
                    attempts,
                    reply = %reply.raw,
                    "backend replied"
                );
                return Ok(reply);
            }
            Err(BackendError::QuotaExhausted(message)) => {
                tracing::warn!(
                    backend = backend.name(),
                    attempt = attempts,
                    max_attempts,
                    error = %message,
                    "quota exhausted"
                );

                if attempts >= max_attempts {
                    return Err(CallError::Exhausted { attempts });
                }

                tracing::info!(
                    delay_secs = policy.retry_delay.as_secs_f64(),
                    "retrying after fixed delay"
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "backend call failed");
                return Err(CallError::Backend(e));
            }
        }
    }
}
