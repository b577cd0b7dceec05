//! Configuration management for the companion
//!
//! Values are layered env > TOML file > default, mirroring how the process is
//! deployed next to the speech services on the home gateway.

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::SecretString;

use crate::Result;
use file::CompanionConfigFile;

/// Default speech service URL (capture and delivery share one web service)
pub const DEFAULT_SPEECH_URL: &str = "http://localhost:3000";

/// Default Gemini model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Phrases the speech service returns instead of a real transcript
pub const DEFAULT_BLOCK_LIST: [&str; 4] = [
    "silencioso",
    "no se pudo transcribir",
    "no se encontró audio",
    "sin resultados",
];

/// Companion configuration
#[derive(Debug)]
pub struct Config {
    /// Speech capture and delivery
    pub speech: SpeechConfig,

    /// Language backend
    pub llm: LlmConfig,

    /// Turn driver
    pub session: SessionSettings,
}

/// Speech service configuration
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Base URL of the speech-capture service
    pub capture_url: String,

    /// Base URL of the speech-delivery service
    pub delivery_url: String,

    /// Transcripts must be longer than this many characters
    pub min_chars: usize,

    /// Case-insensitive substrings that disqualify a transcript
    pub block_list: Vec<String>,

    /// Per-request HTTP timeout for both speech services
    pub request_timeout: Duration,
}

/// Language backend configuration
#[derive(Debug)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// API key (from `GEMINI_API_KEY`)
    pub api_key: Option<SecretString>,

    /// Attempts per turn before giving up on quota exhaustion
    pub max_attempts: u32,

    /// Fixed wait between quota-exhausted attempts
    pub retry_delay: Duration,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

/// Turn driver configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Number of turns before the session ends
    pub max_turns: u32,

    /// How long to wait for user speech before going proactive
    pub listen_timeout: Duration,

    /// Spacing between speech-capture polls
    pub poll_interval: Duration,

    /// Render only the newest N history entries into the prompt
    pub history_window: Option<usize>,

    /// Occupant identifier
    pub user: String,

    /// Path to the context profile file
    pub context_file: PathBuf,

    /// Directory holding per-user activity notes
    pub activity_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the environment and a TOML file
    ///
    /// An explicit `path` must exist and parse; the default path is optional.
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let fc = match path {
            Some(p) => file::load_config_file_from(p)?,
            None => file::load_config_file(),
        };

        Ok(Self::resolve(fc, |key| std::env::var(key).ok()))
    }

    /// Merge a parsed config file with environment lookups and defaults
    ///
    /// `env` is injected so resolution can be exercised without touching the
    /// process environment.
    pub fn resolve(fc: CompanionConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let speech = SpeechConfig {
            capture_url: env("COMPANION_CAPTURE_URL")
                .or(fc.speech.capture_url)
                .unwrap_or_else(|| DEFAULT_SPEECH_URL.to_string()),
            delivery_url: env("COMPANION_DELIVERY_URL")
                .or(fc.speech.delivery_url)
                .unwrap_or_else(|| DEFAULT_SPEECH_URL.to_string()),
            min_chars: fc.speech.min_chars.unwrap_or(3),
            block_list: fc.speech.block_list.unwrap_or_else(|| {
                DEFAULT_BLOCK_LIST.iter().map(ToString::to_string).collect()
            }),
            request_timeout: Duration::from_secs(fc.speech.request_timeout_secs.unwrap_or(10)),
        };

        let llm = LlmConfig {
            model: env("COMPANION_LLM_MODEL")
                .or(fc.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: fc
                .llm
                .base_url
                .unwrap_or_else(|| DEFAULT_GEMINI_URL.to_string()),
            api_key: env("GEMINI_API_KEY")
                .filter(|k| !k.is_empty())
                .map(SecretString::from),
            max_attempts: fc.llm.max_attempts.unwrap_or(6).max(1),
            retry_delay: Duration::from_secs(fc.llm.retry_delay_secs.unwrap_or(30)),
            request_timeout: Duration::from_secs(fc.llm.request_timeout_secs.unwrap_or(60)),
        };

        let session = SessionSettings {
            max_turns: env("COMPANION_MAX_TURNS")
                .and_then(|s| s.parse().ok())
                .or(fc.session.max_turns)
                .unwrap_or(6),
            listen_timeout: Duration::from_secs(fc.session.listen_timeout_secs.unwrap_or(40)),
            poll_interval: Duration::from_millis(fc.session.poll_interval_ms.unwrap_or(500)),
            history_window: fc.session.history_window,
            user: env("COMPANION_USER")
                .or(fc.session.user)
                .unwrap_or_else(|| "11pe".to_string()),
            context_file: env("COMPANION_CONTEXT_FILE")
                .or(fc.session.context_file)
                .map_or_else(|| PathBuf::from("contexto_llm.toml"), PathBuf::from),
            activity_dir: fc.session.activity_dir.map(PathBuf::from),
        };

        Self {
            speech,
            llm,
            session,
        }
    }
}
