//! Static context profile
//!
//! The profile file carries the fixed instructions given to the backend
//! every turn plus one context entry per occupant:
//!
//! ```toml
//! [context]
//! initial = "Eres un asistente..."
//! question_format = "..."
//! preaction_format = "..."
//!
//! [users.11pe]
//! context = "Vive solo, se levanta a las 8..."
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::activity::{Activity, ActivityCatalog};
use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct ProfileFile {
    context: ContextSection,
    #[serde(default)]
    users: HashMap<String, UserSection>,
    #[serde(default)]
    activities: BTreeMap<String, ActivitySection>,
}

#[derive(Debug, Deserialize)]
struct ContextSection {
    initial: String,
    question_format: String,
    #[serde(default)]
    preaction_format: String,
}

#[derive(Debug, Deserialize)]
struct UserSection {
    context: String,
}

#[derive(Debug, Deserialize)]
struct ActivitySection {
    room: String,
    action: String,
}

/// Static context for one occupant, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextProfile {
    /// Opening instructions
    pub initial: String,
    /// How questions to the occupant should be phrased
    pub question_format: String,
    /// How suggested actions should be phrased
    pub preaction_format: String,
    /// Occupant identifier
    pub user: String,
    /// Occupant-specific context
    pub user_context: String,
    /// Activity catalogue override, when the file defines one
    pub activities: Option<ActivityCatalog>,
}

impl ContextProfile {
    /// Load the profile for `user` from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if the file is missing, malformed, or has no entry for `user`
    pub fn load(path: &Path, user: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read context file {}: {e}", path.display()))
        })?;
        let profile = Self::parse(&content, user)?;
        tracing::info!(path = %path.display(), user, "loaded context profile");
        Ok(profile)
    }

    /// Parse a profile from TOML text
    ///
    /// # Errors
    ///
    /// Returns error if the text is malformed or has no entry for `user`
    pub fn parse(content: &str, user: &str) -> Result<Self> {
        let mut file: ProfileFile = toml::from_str(content)?;

        let user_context = file
            .users
            .remove(user)
            .ok_or_else(|| Error::Config(format!("no context for user '{user}'")))?
            .context;

        let activities = (!file.activities.is_empty()).then(|| {
            ActivityCatalog::new(
                file.activities
                    .into_iter()
                    .map(|(key, a)| Activity::new(key, a.room, a.action))
                    .collect(),
            )
        });

        Ok(Self {
            initial: file.context.initial,
            question_format: file.context.question_format,
            preaction_format: file.context.preaction_format,
            user: user.to_string(),
            user_context,
            activities,
        })
    }

    /// Concatenate the static context block sent with every prompt
    #[must_use]
    pub fn static_context(&self) -> String {
        format!(
            "{}{}{}",
            self.initial, self.question_format, self.user_context
        )
    }
}
