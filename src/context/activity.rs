//! Household activity catalogue and per-occupant activity notes
//!
//! Activity notes are pre-computed descriptions of what the occupant has
//! been doing, produced by the home's activity recognition pipeline. They are
//! read as opaque text; this module only locates and frames them.

use std::path::Path;

/// A recognised household activity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    /// Short key used by the recognition pipeline (e.g. "cocinar")
    pub key: String,
    /// Room where the activity happens
    pub room: String,
    /// Human-readable description of the action
    pub action: String,
}

impl Activity {
    /// Create a new activity entry
    pub fn new(key: impl Into<String>, room: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            room: room.into(),
            action: action.into(),
        }
    }
}

/// Set of activities the home can recognise
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCatalog {
    activities: Vec<Activity>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        Self::new(vec![
            Activity::new("cocinar", "cocina", "cocinar"),
            Activity::new("ducharse", "baño", "ducharse o bañarse"),
            Activity::new("deponer", "baño", "ir al baño"),
            Activity::new("asearse", "baño", "asearse o lavarse la cara"),
            Activity::new("pc", "habitacion", "jugar juegos o usar el ordenador"),
            Activity::new("dormir", "dormitorio", "dormir"),
            Activity::new("descansar", "salon", "descansar o echarse una siesta"),
            Activity::new("salir", "puerta salida", "salir de casa"),
        ])
    }
}

impl ActivityCatalog {
    /// Create a catalogue from explicit entries
    #[must_use]
    pub const fn new(activities: Vec<Activity>) -> Self {
        Self { activities }
    }

    /// Number of activities
    #[must_use]
    pub fn len(&self) -> usize {
        self.activities.len()
    }

    /// Whether the catalogue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }

    /// Room associated with an activity key
    #[must_use]
    pub fn room_of(&self, key: &str) -> Option<&str> {
        self.activities
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.room.as_str())
    }

    /// Render the catalogue as a context block, one activity per line
    #[must_use]
    pub fn render(&self) -> String {
        let lines: Vec<String> = self
            .activities
            .iter()
            .map(|a| format!("- {} ({}): {}", a.key, a.room, a.action))
            .collect();
        format!("Actividades conocidas:\n{}", lines.join("\n"))
    }
}

/// Load pre-computed activity notes for `user` from `{dir}/{user}.txt`
///
/// A missing or empty notes file yields `None`; notes are optional context.
pub fn load_notes(dir: &Path, user: &str) -> Option<String> {
    let path = dir.join(format!("{user}.txt"));
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let text = text.trim();
            if text.is_empty() {
                None
            } else {
                tracing::debug!(path = %path.display(), "loaded activity notes");
                Some(text.to_string())
            }
        }
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "no activity notes");
            None
        }
    }
}
