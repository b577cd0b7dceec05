//! Shared test utilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use ambient_companion::voice::InteractionStatus;
use ambient_companion::{
    BackendError, Error, LanguageBackend, PromptComposer, RetryPolicy, Session, SessionConfig,
    SpeechSink, SpeechSource, TranscriptFilter, TranscriptionPoller,
};
use async_trait::async_trait;
use tokio::sync::Mutex;

/// Static context used by session tests
pub const TEST_CONTEXT: &str = "Eres un asistente del hogar. Responde en español.";

/// Speech source handing out scripted transcripts, one per poll
///
/// Once the script runs out every check reports no audio.
pub struct ScriptedSource {
    transcripts: Mutex<VecDeque<String>>,
}

impl ScriptedSource {
    pub fn new(transcripts: &[&str]) -> Self {
        Self {
            transcripts: Mutex::new(transcripts.iter().map(ToString::to_string).collect()),
        }
    }

    pub fn silent() -> Self {
        Self::new(&[])
    }
}

#[async_trait]
impl SpeechSource for ScriptedSource {
    async fn check_interaction(&self) -> ambient_companion::Result<InteractionStatus> {
        if self.transcripts.lock().await.is_empty() {
            Ok(InteractionStatus::NoAudio)
        } else {
            Ok(InteractionStatus::HasAudio)
        }
    }

    async fn transcribe(&self) -> ambient_companion::Result<String> {
        Ok(self.transcripts.lock().await.pop_front().unwrap_or_default())
    }
}

/// Speech sink recording everything it is asked to speak
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            delivered: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A sink whose speech service is down
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub async fn delivered(&self) -> Vec<String> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl SpeechSink for RecordingSink {
    async fn deliver(&self, text: &str) -> ambient_companion::Result<()> {
        if self.fail {
            return Err(Error::Delivery("speech service unavailable".to_string()));
        }
        self.delivered.lock().await.push(text.to_string());
        Ok(())
    }
}

/// Scripted backend response
pub enum Reply {
    Text(&'static str),
    Quota,
    Auth,
}

/// Language backend replaying a script and recording every prompt
///
/// Once the script runs out it answers with a numbered default reply.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Reply>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Reply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Backend that always reports quota exhaustion
    pub fn exhausted(calls: usize) -> Self {
        Self::new((0..calls).map(|_| Reply::Quota).collect())
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl LanguageBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let call = {
            let mut prompts = self.prompts.lock().await;
            prompts.push(prompt.to_string());
            prompts.len()
        };

        match self.script.lock().await.pop_front() {
            Some(Reply::Text(text)) => Ok(text.to_string()),
            Some(Reply::Quota) => Err(BackendError::QuotaExhausted(
                "RESOURCE_EXHAUSTED".to_string(),
            )),
            Some(Reply::Auth) => Err(BackendError::Auth("API key not valid".to_string())),
            None => Ok(format!("Sugerencia número {call}")),
        }
    }
}

/// Session timings short enough for tests
pub fn fast_config(max_turns: u32, max_attempts: u32) -> SessionConfig {
    SessionConfig {
        max_turns,
        listen_timeout: Duration::from_millis(40),
        poll_interval: Duration::from_millis(5),
        retry: RetryPolicy::new(max_attempts, Duration::from_millis(1)),
    }
}

/// Build a session over the given mocks
pub fn build_session(
    source: Arc<ScriptedSource>,
    backend: Arc<ScriptedBackend>,
    sink: Arc<RecordingSink>,
    composer: PromptComposer,
    config: SessionConfig,
) -> Session {
    let filter = TranscriptFilter::new(3, ["no sé", "no quiero"]);
    let poller = TranscriptionPoller::new(source, filter);
    Session::new(poller, backend, sink, composer, config)
}

/// Composer over the shared test context
pub fn test_composer() -> PromptComposer {
    PromptComposer::new(TEST_CONTEXT.to_string())
}
