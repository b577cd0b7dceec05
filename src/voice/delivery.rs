//! Speech delivery
//!
//! Replies are posted to the speech service, which synthesizes and plays them
//! back to the occupant. Backend replies may carry a trailing score
//! annotation (`"texto", 3)`) that must not be spoken.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::{Error, Result};

/// Path accepting text to be spoken
pub const DELIVERY_PATH: &str = "/api/respuesta-chatbot";

/// Optional opening quote, lazily captured text, optional closing quote,
/// then a comma and an integer tag with an optional closing parenthesis.
/// Anchored at the start only; anything after the tag is ignored.
static ANNOTATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^["“]?(.+?)["”]?\s*,\s*(\d+)\)?"#).expect("valid regex")
});

/// Extract the spoken part of a raw backend reply
///
/// Returns the text before a trailing `, <integer>)` annotation, or the whole
/// reply unchanged when there is no annotation.
#[must_use]
pub fn split_annotation(raw: &str) -> &str {
    ANNOTATION_REGEX
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map_or(raw, |m| m.as_str().trim())
}

/// Destination for companion speech
#[async_trait]
pub trait SpeechSink: Send + Sync {
    /// Have `text` spoken to the occupant
    async fn deliver(&self, text: &str) -> Result<()>;
}

/// HTTP client for the speech-delivery endpoint
pub struct HttpSpeechDelivery {
    client: reqwest::Client,
    url: String,
}

impl HttpSpeechDelivery {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a client sharing an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let url = format!("{}{DELIVERY_PATH}", base_url.trim_end_matches('/'));
        Self { client, url }
    }
}

#[async_trait]
impl SpeechSink for HttpSpeechDelivery {
    async fn deliver(&self, text: &str) -> Result<()> {
        #[derive(serde::Serialize)]
        struct DeliveryRequest<'a> {
            texto: &'a str,
        }

        let response = self
            .client
            .post(&self.url)
            .json(&DeliveryRequest { texto: text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!("speech service error {status}: {body}")));
        }

        Ok(())
    }
}

/// Speak a raw backend reply, stripping any trailing annotation first
///
/// Failures are logged and returned; callers treat them as non-fatal.
///
/// # Errors
///
/// Returns error if the speech service rejects the text or is unreachable
pub async fn disseminate(sink: &dyn SpeechSink, raw_reply: &str) -> Result<()> {
    let spoken = split_annotation(raw_reply);

    match sink.deliver(spoken).await {
        Ok(()) => {
            tracing::info!(text = spoken, "reply delivered");
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to deliver reply");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_tag() {
        assert_eq!(split_annotation("Hola, 3)"), "Hola");
    }

    #[test]
    fn strips_quoted_text_and_tag() {
        assert_eq!(
            split_annotation("\"¿Quieres preparar la cena?\", 7)"),
            "¿Quieres preparar la cena?"
        );
        assert_eq!(split_annotation("“Buenas noches”, 2"), "Buenas noches");
    }

    #[test]
    fn leaves_plain_text_unchanged() {
        assert_eq!(split_annotation("Hola sin anotación"), "Hola sin anotación");
        assert_eq!(split_annotation(""), "");
    }

    #[test]
    fn comma_without_integer_is_not_annotation() {
        let raw = "Claro, ahora mismo apago la luz.";
        assert_eq!(split_annotation(raw), raw);
    }

    #[test]
    fn first_comma_integer_wins() {
        // literal matching: the earliest ", <digits>" ends the spoken text
        assert_eq!(split_annotation("Tienes 3, 4 tareas"), "Tienes 3");
    }

    #[test]
    fn delivery_url_joins_path() {
        let delivery = HttpSpeechDelivery::new("http://localhost:3000/");
        assert_eq!(delivery.url, "http://localhost:3000/api/respuesta-chatbot");
    }
}
