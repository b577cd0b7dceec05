//! TOML configuration file loading
//!
//! Supports `~/.config/ambient-companion/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct CompanionConfigFile {
    /// Speech capture and delivery services
    #[serde(default)]
    pub speech: SpeechFileConfig,

    /// Language backend configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Turn driver configuration
    #[serde(default)]
    pub session: SessionFileConfig,
}

/// Speech service configuration
#[derive(Debug, Default, Deserialize)]
pub struct SpeechFileConfig {
    /// Base URL of the speech-capture service (e.g. "http://localhost:3000")
    pub capture_url: Option<String>,

    /// Base URL of the speech-delivery service
    pub delivery_url: Option<String>,

    /// Transcripts must be longer than this many characters
    pub min_chars: Option<usize>,

    /// Phrases marking a transcript as noise or a failed transcription
    pub block_list: Option<Vec<String>>,

    /// Per-request HTTP timeout for both speech services
    pub request_timeout_secs: Option<u64>,
}

/// Language backend configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gemini-2.0-flash")
    pub model: Option<String>,

    /// API base URL
    pub base_url: Option<String>,

    /// Attempts per turn before giving up on quota exhaustion
    pub max_attempts: Option<u32>,

    /// Fixed wait between quota-exhausted attempts
    pub retry_delay_secs: Option<u64>,

    /// Per-request HTTP timeout
    pub request_timeout_secs: Option<u64>,
}

/// Session configuration
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    /// Number of turns before the session ends
    pub max_turns: Option<u32>,

    /// How long to wait for user speech before going proactive
    pub listen_timeout_secs: Option<u64>,

    /// Spacing between speech-capture polls
    pub poll_interval_ms: Option<u64>,

    /// Render only the newest N history entries into the prompt
    pub history_window: Option<usize>,

    /// Occupant identifier used to select the per-user context
    pub user: Option<String>,

    /// Path to the context profile file
    pub context_file: Option<String>,

    /// Directory holding per-user activity notes
    pub activity_dir: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `CompanionConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> CompanionConfigFile {
    let Some(path) = config_file_path() else {
        return CompanionConfigFile::default();
    };

    if !path.exists() {
        return CompanionConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            CompanionConfigFile::default()
        }
    }
}

/// Load a TOML config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<CompanionConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    tracing::info!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Return the config file path: `~/.config/ambient-companion/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.config_dir().join("ambient-companion").join("config.toml"))
}
