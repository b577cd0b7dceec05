//! Session - the interaction loop
//!
//! Sequences listening, prompting, generation, and delivery for a fixed
//! number of turns. The session owns the conversation history; nothing else
//! reads or writes it while the loop runs.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;

use crate::context::{ConversationHistory, PromptComposer, load_static_context};
use crate::llm::{CallError, GeminiBackend, LanguageBackend, RetryPolicy, call_with_retry};
use crate::voice::{
    HttpSpeechCapture, HttpSpeechDelivery, PollResult, SpeechSink, TranscriptFilter,
    TranscriptionPoller, disseminate, speech_client,
};
use crate::{Config, Result};

/// Turn driver configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of turns before the session ends
    pub max_turns: u32,
    /// How long each turn waits for occupant speech
    pub listen_timeout: Duration,
    /// Spacing between speech-capture polls
    pub poll_interval: Duration,
    /// Backend retry policy, applied afresh every turn
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_turns: 6,
            listen_timeout: Duration::from_secs(40),
            poll_interval: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            max_turns: config.session.max_turns,
            listen_timeout: config.session.listen_timeout,
            poll_interval: config.session.poll_interval,
            retry: RetryPolicy::new(config.llm.max_attempts, config.llm.retry_delay),
        }
    }
}

/// How a turn was driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnMode {
    /// The occupant said something this turn
    Reactive,
    /// The occupant was silent; the companion took the initiative
    Proactive,
}

/// What came of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnResult {
    /// The backend replied; `delivered` is false if the speech service failed
    Replied {
        /// Whether the speech service accepted the reply
        delivered: bool,
    },
    /// Every attempt hit the backend quota
    RetriesExhausted {
        /// Attempts made
        attempts: u32,
    },
    /// The backend failed with a non-retryable error
    BackendFailed(String),
}

/// Record of one completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// 1-based turn number
    pub index: u32,
    /// Reactive or proactive
    pub mode: TurnMode,
    /// Result of the turn
    pub result: TurnResult,
}

impl TurnOutcome {
    /// Whether the backend produced a reply this turn
    #[must_use]
    pub const fn replied(&self) -> bool {
        matches!(self.result, TurnResult::Replied { .. })
    }
}

/// Summary of a session run
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
    /// Outcomes of the completed turns, in order
    pub outcomes: Vec<TurnOutcome>,
    /// Whether the session stopped early on a shutdown signal
    pub interrupted: bool,
}

impl SessionReport {
    /// Turns that produced a reply
    #[must_use]
    pub fn replied(&self) -> usize {
        self.outcomes.iter().filter(|o| o.replied()).count()
    }

    /// Turns that produced no reply
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.replied()
    }
}

/// A single occupant's conversation with the companion
pub struct Session {
    poller: TranscriptionPoller,
    backend: Arc<dyn LanguageBackend>,
    sink: Arc<dyn SpeechSink>,
    composer: PromptComposer,
    history: ConversationHistory,
    config: SessionConfig,
}

impl Session {
    /// Create a session with an empty history
    pub fn new(
        poller: TranscriptionPoller,
        backend: Arc<dyn LanguageBackend>,
        sink: Arc<dyn SpeechSink>,
        composer: PromptComposer,
        config: SessionConfig,
    ) -> Self {
        Self {
            poller,
            backend,
            sink,
            composer,
            history: ConversationHistory::new(),
            config,
        }
    }

    /// Wire a session to the HTTP speech services and Gemini
    ///
    /// # Errors
    ///
    /// Returns error if the context profile cannot be loaded, the API key is
    /// missing, or an HTTP client cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        let session_config = SessionConfig::from(&config);
        let context = load_static_context(&config.session)?;
        let composer =
            PromptComposer::new(context).with_history_window(config.session.history_window);

        let client = speech_client(config.speech.request_timeout)?;
        let capture = HttpSpeechCapture::with_client(client.clone(), &config.speech.capture_url);
        let delivery = HttpSpeechDelivery::with_client(client, &config.speech.delivery_url);
        let poller = TranscriptionPoller::new(
            Arc::new(capture),
            TranscriptFilter::from(&config.speech),
        );
        let backend = GeminiBackend::from_config(config.llm)?;

        Ok(Self::new(
            poller,
            Arc::new(backend),
            Arc::new(delivery),
            composer,
            session_config,
        ))
    }

    /// Conversation so far
    #[must_use]
    pub const fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run all turns, stopping early if `shutdown` completes
    pub async fn run(&mut self, shutdown: impl Future<Output = ()>) -> SessionReport {
        tokio::pin!(shutdown);

        let mut report = SessionReport::default();
        tracing::info!(
            max_turns = self.config.max_turns,
            backend = self.backend.name(),
            "session started"
        );

        for index in 1..=self.config.max_turns {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!(turn = index, "shutdown requested");
                    report.interrupted = true;
                    break;
                }
                outcome = self.run_turn(index) => report.outcomes.push(outcome),
            }
        }

        tracing::info!(
            turns = report.outcomes.len(),
            replied = report.replied(),
            failed = report.failed(),
            history = self.history.len(),
            "session finished"
        );

        report
    }

    /// Run one turn: listen, compose, generate, deliver, record
    pub async fn run_turn(&mut self, index: u32) -> TurnOutcome {
        let span = tracing::info_span!("turn", turn = index);
        self.turn(index).instrument(span).await
    }

    async fn turn(&mut self, index: u32) -> TurnOutcome {
        let poll = self
            .poller
            .acquire(self.config.listen_timeout, self.config.poll_interval)
            .await;

        let prompt = self.composer.compose(&self.history, &poll);

        let mode = match &poll {
            PollResult::Utterance(text) => {
                self.history.append_user(text.as_str());
                TurnMode::Reactive
            }
            PollResult::NoInput => TurnMode::Proactive,
        };
        tracing::debug!(?mode, prompt_chars = prompt.chars().count(), "prompt composed");

        let reply = call_with_retry(self.backend.as_ref(), &prompt, &self.config.retry).await;
        let result = match reply {
            Ok(reply) => {
                let delivered = disseminate(self.sink.as_ref(), &reply.raw).await.is_ok();
                self.history.append_assistant(reply.raw);
                TurnResult::Replied { delivered }
            }
            Err(CallError::Exhausted { attempts }) => {
                tracing::warn!(attempts, "no reply this turn, quota exhausted");
                TurnResult::RetriesExhausted { attempts }
            }
            Err(CallError::Backend(e)) => {
                tracing::warn!(error = %e, "no reply this turn");
                TurnResult::BackendFailed(e.to_string())
            }
        };

        TurnOutcome {
            index,
            mode,
            result,
        }
    }
}
