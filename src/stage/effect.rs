//! Effects produced by stage transitions

use crate::db::{MessageContent, Role};

/// Effects to be executed after a transition.
///
/// Pure data; the session runtime interprets them. Effects that involve
/// I/O complete by feeding a follow-up event back into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation log
    Append { role: Role, content: MessageContent },

    /// Run the classifier over a task prompt; completes as `Classified`
    Classify { prompt: String },

    /// Slice the LLM catalog; completes as `LlmBatch`
    FetchLlmBatch { category: String, offset: usize },

    /// Slice the tool catalog; completes as `ToolBatch`
    FetchToolBatch { category: String, offset: usize },

    /// Forward a single prompt to the chat relay; completes as `ChatReply`
    /// or `ChatFailed`
    RelayPrompt { prompt: String },

    /// Forward the full message history to the chat relay
    RelayHistory,
}

impl Effect {
    /// Append an assistant-authored plain-text message
    pub fn say(text: impl Into<String>) -> Self {
        Effect::Append {
            role: Role::Ai,
            content: MessageContent::text(text),
        }
    }

    /// Append the user's own message to the log
    pub fn echo_user(text: impl Into<String>) -> Self {
        Effect::Append {
            role: Role::User,
            content: MessageContent::text(text),
        }
    }
}
