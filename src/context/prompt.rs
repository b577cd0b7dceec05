//! Per-turn prompt composition
//!
//! Reactive turns put the occupant's latest words behind an explicit
//! priority marker; proactive turns ask the backend to suggest something on
//! its own. Composition is pure so every turn's prompt can be reproduced
//! from its inputs.

use super::history::ConversationHistory;
use crate::voice::PollResult;

/// Header preceding the rendered history
pub const HISTORY_HEADER: &str = "Historial de la conversación: ";

/// Marker preceding fresh user speech
pub const PRIORITY_MARKER: &str = "[Interacción reciente del usuario, DALE PRIORIDAD]";

/// Instruction closing a reactive prompt
pub const RESPOND_INSTRUCTION: &str = "Responde de manera concisa y útil:";

/// Instruction used when the occupant said nothing
pub const PROACTIVE_MARKER: &str =
    "[Modo proactivo]: Sugiere acciones basadas en los datos sin esperar input del usuario.";

/// Compose the prompt for one turn using the full history
#[must_use]
pub fn compose(context: &str, history: &ConversationHistory, poll: &PollResult) -> String {
    compose_rendered(context, &history.render(), poll)
}

/// Compose the prompt for one turn from already-rendered history
#[must_use]
pub fn compose_rendered(context: &str, rendered_history: &str, poll: &PollResult) -> String {
    match poll {
        PollResult::Utterance(text) => format!(
            "{context}\n{HISTORY_HEADER}{rendered_history}\n{PRIORITY_MARKER}: {text}\n{RESPOND_INSTRUCTION}"
        ),
        PollResult::NoInput => {
            format!("{context}\n{HISTORY_HEADER}{rendered_history}\n{PROACTIVE_MARKER}")
        }
    }
}

/// Prompt composer bound to the session's static context
#[derive(Debug, Clone)]
pub struct PromptComposer {
    context: String,
    history_window: Option<usize>,
}

impl PromptComposer {
    /// Create a composer rendering the whole history every turn
    #[must_use]
    pub const fn new(context: String) -> Self {
        Self {
            context,
            history_window: None,
        }
    }

    /// Render only the newest `window` history entries into each prompt
    #[must_use]
    pub const fn with_history_window(mut self, window: Option<usize>) -> Self {
        self.history_window = window;
        self
    }

    /// Static context block
    #[must_use]
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Compose the prompt for this turn
    #[must_use]
    pub fn compose(&self, history: &ConversationHistory, poll: &PollResult) -> String {
        match self.history_window {
            Some(max) => compose_rendered(&self.context, &history.render_window(max), poll),
            None => compose(&self.context, history, poll),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.append_user("tengo hambre");
        history.append_assistant("¿Quieres que te sugiera una receta?");
        history
    }

    #[test]
    fn reactive_prompt_layout() {
        let prompt = compose(
            "CTX",
            &sample_history(),
            &PollResult::Utterance("quiero dormir".to_string()),
        );

        assert_eq!(
            prompt,
            "CTX\nHistorial de la conversación: Usuario: tengo hambre\n\
             Chatbot: ¿Quieres que te sugiera una receta?\n\
             [Interacción reciente del usuario, DALE PRIORIDAD]: quiero dormir\n\
             Responde de manera concisa y útil:"
        );
    }

    #[test]
    fn proactive_prompt_layout() {
        let prompt = compose("CTX", &ConversationHistory::new(), &PollResult::NoInput);

        assert_eq!(
            prompt,
            "CTX\nHistorial de la conversación: \n[Modo proactivo]: Sugiere acciones basadas en los datos sin esperar input del usuario."
        );
    }

    #[test]
    fn markers_are_mode_exclusive() {
        let history = sample_history();
        let reactive = compose("CTX", &history, &PollResult::Utterance("hola hola".into()));
        let proactive = compose("CTX", &history, &PollResult::NoInput);

        assert!(reactive.contains(PRIORITY_MARKER));
        assert!(!reactive.contains(PROACTIVE_MARKER));
        assert!(proactive.contains(PROACTIVE_MARKER));
        assert!(!proactive.contains(PRIORITY_MARKER));
    }

    #[test]
    fn compose_is_deterministic() {
        let history = sample_history();
        let poll = PollResult::Utterance("enciende la luz".into());
        assert_eq!(compose("CTX", &history, &poll), compose("CTX", &history, &poll));
    }

    #[test]
    fn composer_window_limits_history() {
        let composer = PromptComposer::new("CTX".to_string()).with_history_window(Some(1));
        let prompt = composer.compose(&sample_history(), &PollResult::NoInput);

        assert!(!prompt.contains("tengo hambre"));
        assert!(prompt.contains("Chatbot: ¿Quieres que te sugiera una receta?"));
    }

    #[test]
    fn composer_without_window_matches_free_function() {
        let composer = PromptComposer::new("CTX".to_string());
        let history = sample_history();
        assert_eq!(
            composer.compose(&history, &PollResult::NoInput),
            compose("CTX", &history, &PollResult::NoInput)
        );
    }
}
