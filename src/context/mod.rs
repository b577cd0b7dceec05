//! Context building for companion conversations
//!
//! Combines:
//! - Static context (profile file + optional activity notes)
//! - Session history (everything said so far)
//! - This turn's poll result (fresh speech or silence)

pub mod activity;
mod history;
mod profile;
mod prompt;

pub use activity::{Activity, ActivityCatalog};
pub use history::{ConversationHistory, Role, Utterance};
pub use profile::ContextProfile;
pub use prompt::{
    HISTORY_HEADER, PRIORITY_MARKER, PROACTIVE_MARKER, PromptComposer, RESPOND_INSTRUCTION,
    compose, compose_rendered,
};

use crate::Result;
use crate::config::SessionSettings;

/// Load the profile and activity notes named by `settings` into a static context block
///
/// # Errors
///
/// Returns error if the context profile cannot be loaded for the configured user
pub fn load_static_context(settings: &SessionSettings) -> Result<String> {
    let profile = ContextProfile::load(&settings.context_file, &settings.user)?;
    let notes = settings
        .activity_dir
        .as_deref()
        .and_then(|dir| activity::load_notes(dir, &settings.user));
    Ok(build_static_context(&profile, notes.as_deref()))
}

/// Build the static context block for a session
///
/// Without activity notes this is exactly the profile's concatenated context.
/// With notes, the activity catalogue and the notes are appended so proactive
/// turns have something concrete to suggest from.
#[must_use]
pub fn build_static_context(profile: &ContextProfile, notes: Option<&str>) -> String {
    let base = profile.static_context();
    let Some(notes) = notes else {
        return base;
    };

    let catalog = profile.activities.clone().unwrap_or_default();
    format!("{base}\n{}\nActividad reciente:\n{notes}", catalog.render())
}
