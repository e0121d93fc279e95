//! Session state types

use serde::{Deserialize, Serialize};

/// Current step of the guided recommendation conversation.
///
/// `Onboarding` is entered when a conversation becomes active. `Idle` is a
/// resting state reachable from several branches and is re-entrant - free
/// text there goes to the plain chat relay. No stage is terminal; the
/// machine cycles for the life of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Onboarding,
    AwaitStartConfirm,
    AwaitTaskPrompt,
    AwaitLlmPreferences,
    AwaitLlmAction,
    AwaitToolAction,
    AwaitHuggingfacePrompt,
    Idle,
}

/// Per-open-conversation session state.
///
/// Held in memory only - a freshly opened conversation starts over from
/// `Onboarding`. Exactly one stage is active at a time; the catalog
/// offsets never regress within a session and reset when a new task
/// prompt is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub stage: Stage,
    /// Category cached from the most recent classification
    pub category: Option<String>,
    /// Cursor into the LLM catalog for "show more"
    pub llm_offset: usize,
    /// Cursor into the tool catalog, advanced independently
    pub tool_offset: usize,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_in_onboarding() {
        let session = Session::new();
        assert_eq!(session.stage, Stage::Onboarding);
        assert_eq!(session.category, None);
        assert_eq!(session.llm_offset, 0);
        assert_eq!(session.tool_offset, 0);
    }
}
