//! Conversation history for a single session

use std::fmt;

/// Who spoke an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// The occupant
    User,
    /// The companion
    Assistant,
}

impl Role {
    /// Label used when rendering history into a prompt
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::User => "Usuario",
            Self::Assistant => "Chatbot",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single non-empty line of conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    role: Role,
    text: String,
}

impl Utterance {
    /// Create an utterance, rejecting blank text
    #[must_use]
    pub fn new(role: Role, text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { role, text })
    }

    /// Speaker
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Spoken text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Utterance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role.label(), self.text)
    }
}

/// Append-only, insertion-ordered log of the session's utterances
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    entries: Vec<Utterance>,
}

impl ConversationHistory {
    /// Create an empty history
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record what the occupant said
    ///
    /// Returns `false` if `text` is blank and nothing was recorded.
    pub fn append_user(&mut self, text: impl Into<String>) -> bool {
        self.append(Role::User, text)
    }

    /// Record what the companion replied
    ///
    /// Returns `false` if `text` is blank and nothing was recorded.
    pub fn append_assistant(&mut self, text: impl Into<String>) -> bool {
        self.append(Role::Assistant, text)
    }

    fn append(&mut self, role: Role, text: impl Into<String>) -> bool {
        match Utterance::new(role, text) {
            Some(utterance) => {
                self.entries.push(utterance);
                true
            }
            None => {
                tracing::debug!(%role, "ignoring blank utterance");
                false
            }
        }
    }

    /// Number of recorded utterances
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been said yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Utterances, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Utterance> {
        self.entries.iter()
    }

    /// Render every utterance, one role-labelled line each, oldest first
    #[must_use]
    pub fn render(&self) -> String {
        Self::join(&self.entries)
    }

    /// Render only the newest `max` utterances
    #[must_use]
    pub fn render_window(&self, max: usize) -> String {
        let start = self.entries.len().saturating_sub(max);
        Self::join(&self.entries[start..])
    }

    fn join(entries: &[Utterance]) -> String {
        entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
