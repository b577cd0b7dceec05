//! Gemini `generateContent` backend

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{BackendError, LanguageBackend};
use crate::config::LlmConfig;
use crate::{Error, Result};

/// Google Gemini text-generation backend
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl GeminiBackend {
    /// Create a backend for `model` at `base_url`
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty or the HTTP client cannot be built
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config("Gemini API key required".to_string()));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    /// Create a backend from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns error if `GEMINI_API_KEY` is not set
    pub fn from_config(config: LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))?;
        Self::new(config.base_url, config.model, api_key, config.request_timeout)
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Map a failed Gemini response to a backend error
///
/// HTTP 429 and the `RESOURCE_EXHAUSTED` status both mean the quota is spent.
#[must_use]
pub fn classify_error(status: u16, body: &str) -> BackendError {
    let (message, api_status) = serde_json::from_str::<ErrorEnvelope>(body).map_or_else(
        |_| (body.to_string(), String::new()),
        |env| (env.error.message, env.error.status),
    );

    if status == 429 || api_status == "RESOURCE_EXHAUSTED" {
        return BackendError::QuotaExhausted(message);
    }

    match status {
        401 | 403 => BackendError::Auth(message),
        _ => BackendError::Api { status, message },
    }
}

#[async_trait]
impl LanguageBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> std::result::Result<String, BackendError> {
        let request = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Gemini API error");
            return Err(classify_error(status.as_u16(), &body));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Transport(format!("invalid response: {e}")))?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BackendError::EmptyReply);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_is_quota_exhausted() {
        assert!(classify_error(429, "").is_quota_exhausted());
    }

    #[test]
    fn resource_exhausted_status_is_quota() {
        let body = r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#;
        match classify_error(429, body) {
            BackendError::QuotaExhausted(msg) => assert_eq!(msg, "Quota exceeded"),
            other => panic!("expected quota, got {other:?}"),
        }

        // some proxies rewrite the code but keep the status
        assert!(classify_error(503, body).is_quota_exhausted());
    }

    #[test]
    fn auth_errors() {
        let body = r#"{"error":{"code":403,"message":"API key not valid","status":"PERMISSION_DENIED"}}"#;
        assert!(matches!(classify_error(403, body), BackendError::Auth(_)));
        assert!(matches!(classify_error(401, "nope"), BackendError::Auth(_)));
    }

    #[test]
    fn other_errors_keep_status_and_raw_body() {
        match classify_error(500, "upstream down") {
            BackendError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[test]
    fn empty_key_rejected() {
        let result = GeminiBackend::new(
            "http://localhost",
            "gemini-2.0-flash",
            SecretString::from(String::new()),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn endpoint_includes_model() {
        let backend = GeminiBackend::new(
            "https://example.test/v1beta/",
            "gemini-2.0-flash",
            SecretString::from("k".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://example.test/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }
}
