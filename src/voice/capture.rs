//! Speech-capture service client
//!
//! The capture service receives audio from the occupant's phone and exposes
//! two endpoints: one reporting whether fresh audio is waiting, one running
//! speech-to-text over it.

use async_trait::async_trait;
use serde::Deserialize;

use crate::{Error, Result};

/// Path reporting whether new audio is available
pub const CHECK_PATH: &str = "/api/check-interaction";

/// Path returning the transcription of the pending audio
pub const TRANSCRIBE_PATH: &str = "/api/transcribe";

/// Availability of fresh audio on the capture service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionStatus {
    /// Recent audio is waiting to be transcribed
    HasAudio,
    /// No audio has been uploaded
    NoAudio,
    /// Audio exists but is too old to count as a reply
    Stale,
    /// Any status this client does not recognise
    Other(String),
}

impl InteractionStatus {
    fn from_wire(status: &str) -> Self {
        match status {
            "has_audio" => Self::HasAudio,
            "no_audio" => Self::NoAudio,
            "stale_audio" => Self::Stale,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Source of occupant speech
#[async_trait]
pub trait SpeechSource: Send + Sync {
    /// Ask whether fresh audio is available
    async fn check_interaction(&self) -> Result<InteractionStatus>;

    /// Transcribe the pending audio; may be empty
    async fn transcribe(&self) -> Result<String>;
}

#[derive(Deserialize)]
struct CheckResponse {
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    transcript: String,
}

/// HTTP client for the speech-capture service
pub struct HttpSpeechCapture {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSpeechCapture {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client sharing an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Capture(format!("{path} returned {status}: {body}")));
        }

        Ok(response)
    }
}

#[async_trait]
impl SpeechSource for HttpSpeechCapture {
    async fn check_interaction(&self) -> Result<InteractionStatus> {
        let body: CheckResponse = self.get(CHECK_PATH).await?.json().await?;
        Ok(InteractionStatus::from_wire(&body.status))
    }

    async fn transcribe(&self) -> Result<String> {
        let body: TranscribeResponse = self.get(TRANSCRIBE_PATH).await?.json().await?;
        tracing::debug!(transcript = %body.transcript, "transcription received");
        Ok(body.transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_statuses() {
        assert_eq!(InteractionStatus::from_wire("has_audio"), InteractionStatus::HasAudio);
        assert_eq!(InteractionStatus::from_wire("no_audio"), InteractionStatus::NoAudio);
        assert_eq!(InteractionStatus::from_wire("stale_audio"), InteractionStatus::Stale);
        assert_eq!(
            InteractionStatus::from_wire("busy"),
            InteractionStatus::Other("busy".to_string())
        );
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let capture = HttpSpeechCapture::new("http://localhost:3000/");
        assert_eq!(capture.base_url, "http://localhost:3000");
    }
}
