//! Transcription polling
//!
//! Waits up to a fixed budget for the occupant to say something meaningful.
//! Failures talking to the capture service only cost one poll iteration so a
//! flaky service degrades into a proactive turn instead of a stalled session.

use std::sync::Arc;
use std::time::Duration;

use super::capture::{InteractionStatus, SpeechSource};
use crate::config::SpeechConfig;

/// Outcome of waiting for occupant speech
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollResult {
    /// An accepted transcript
    Utterance(String),
    /// Nothing meaningful before the timeout
    NoInput,
}

impl PollResult {
    /// Transcript, if one was accepted
    #[must_use]
    pub fn utterance(&self) -> Option<&str> {
        match self {
            Self::Utterance(text) => Some(text),
            Self::NoInput => None,
        }
    }
}

/// Rules deciding whether a transcript carries real content
#[derive(Debug, Clone)]
pub struct TranscriptFilter {
    min_chars: usize,
    block_list: Vec<String>,
}

impl TranscriptFilter {
    /// Create a filter; block-list phrases are matched case-insensitively
    pub fn new(min_chars: usize, block_list: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            min_chars,
            block_list: block_list
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Return the trimmed transcript if it is long enough and not a non-answer
    #[must_use]
    pub fn accept(&self, transcript: &str) -> Option<String> {
        let text = transcript.trim();
        if text.chars().count() <= self.min_chars {
            return None;
        }

        let lower = text.to_lowercase();
        if let Some(phrase) = self.block_list.iter().find(|p| lower.contains(p.as_str())) {
            tracing::debug!(transcript = text, phrase = %phrase, "transcript blocked");
            return None;
        }

        Some(text.to_string())
    }
}

impl From<&SpeechConfig> for TranscriptFilter {
    fn from(config: &SpeechConfig) -> Self {
        Self::new(config.min_chars, &config.block_list)
    }
}

/// Polls a speech source until an acceptable transcript arrives
pub struct TranscriptionPoller {
    source: Arc<dyn SpeechSource>,
    filter: TranscriptFilter,
}

impl TranscriptionPoller {
    /// Create a poller over `source`
    pub fn new(source: Arc<dyn SpeechSource>, filter: TranscriptFilter) -> Self {
        Self { source, filter }
    }

    /// Run a single check/transcribe round
    ///
    /// Service errors are logged and reported as no result.
    pub async fn poll_once(&self) -> Option<String> {
        match self.source.check_interaction().await {
            Ok(InteractionStatus::HasAudio) => {}
            Ok(status) => {
                tracing::trace!(?status, "no fresh audio");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "interaction check failed");
                return None;
            }
        }

        match self.source.transcribe().await {
            Ok(transcript) => {
                let accepted = self.filter.accept(&transcript);
                if let Some(text) = &accepted {
                    tracing::info!(transcript = %text, "user said");
                }
                accepted
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                None
            }
        }
    }

    /// Wait up to `timeout` for an accepted transcript, polling every `poll_interval`
    ///
    /// Returns as soon as a transcript is accepted. Dropping the returned
    /// future cancels the wait.
    pub async fn acquire(&self, timeout: Duration, poll_interval: Duration) -> PollResult {
        let listen = async {
            loop {
                if let Some(text) = self.poll_once().await {
                    return text;
                }
                tokio::time::sleep(poll_interval).await;
            }
        };

        match tokio::time::timeout(timeout, listen).await {
            Ok(text) => PollResult::Utterance(text),
            Err(_) => {
                tracing::debug!(timeout_ms = timeout.as_millis(), "no user input before timeout");
                PollResult::NoInput
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::Error;
    use crate::config::DEFAULT_BLOCK_LIST;

    fn filter() -> TranscriptFilter {
        TranscriptFilter::new(3, DEFAULT_BLOCK_LIST)
    }

    /// Source whose first `failures` checks error, then always has audio
    struct RecoveringSource {
        failures: u32,
        checks: AtomicU32,
        transcripts: Mutex<VecDeque<&'static str>>,
    }

    impl RecoveringSource {
        fn new(failures: u32, transcripts: &[&'static str]) -> Self {
            Self {
                failures,
                checks: AtomicU32::new(0),
                transcripts: Mutex::new(transcripts.iter().copied().collect()),
            }
        }
    }

    #[async_trait]
    impl SpeechSource for RecoveringSource {
        async fn check_interaction(&self) -> crate::Result<InteractionStatus> {
            let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
            if n <= self.failures {
                return Err(Error::Capture("connection refused".to_string()));
            }
            Ok(InteractionStatus::HasAudio)
        }

        async fn transcribe(&self) -> crate::Result<String> {
            let next = self.transcripts.lock().unwrap().pop_front();
            Ok(next.unwrap_or_default().to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn keeps_polling_past_errors_and_rejections() {
        let source = Arc::new(RecoveringSource::new(2, &["silencioso", "quiero dormir"]));
        let poller = TranscriptionPoller::new(
            Arc::clone(&source) as Arc<dyn SpeechSource>,
            filter(),
        );

        let start = tokio::time::Instant::now();
        let result = poller
            .acquire(Duration::from_secs(5), Duration::from_millis(10))
            .await;

        assert_eq!(result, PollResult::Utterance("quiero dormir".to_string()));
        assert_eq!(source.checks.load(Ordering::SeqCst), 4);
        // two failed checks and one rejected transcript cost one interval each
        assert_eq!(start.elapsed(), Duration::from_millis(30));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_no_input_at_timeout() {
        let source = Arc::new(RecoveringSource::new(u32::MAX, &[]));
        let poller = TranscriptionPoller::new(source, filter());

        let start = tokio::time::Instant::now();
        let result = poller
            .acquire(Duration::from_millis(100), Duration::from_millis(10))
            .await;

        assert_eq!(result, PollResult::NoInput);
        assert_eq!(start.elapsed(), Duration::from_millis(100));
    }

    #[test]
    fn accepts_meaningful_speech() {
        assert_eq!(
            filter().accept("  quiero dormir "),
            Some("quiero dormir".to_string())
        );
    }

    #[test]
    fn rejects_short_or_empty() {
        let f = filter();
        assert!(f.accept("").is_none());
        assert!(f.accept("   ").is_none());
        assert!(f.accept("sí").is_none());
        assert!(f.accept("hola").is_some());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // four characters, more than four bytes
        assert!(filter().accept("ñañá").is_some());
        assert!(filter().accept("ñañ").is_none());
    }

    #[test]
    fn rejects_block_list_case_insensitive() {
        let f = filter();
        assert!(f.accept("No se pudo transcribir el audio (sin resultados).").is_none());
        assert!(f.accept("SILENCIOSO").is_none());
        assert!(f.accept("no se encontró audio").is_none());
    }

    #[test]
    fn custom_block_list_is_lowercased() {
        let f = TranscriptFilter::new(0, ["RUIDO"]);
        assert!(f.accept("mucho ruido aquí").is_none());
        assert!(f.accept("tranquilo").is_some());
    }

    #[test]
    fn poll_result_accessor() {
        assert_eq!(PollResult::Utterance("hola".into()).utterance(), Some("hola"));
        assert_eq!(PollResult::NoInput.utterance(), None);
    }
}
