//! Events that drive stage transitions

use crate::catalog::{LlmRecord, ToolRecord};
use serde::{Deserialize, Serialize};

/// Card button actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardAction {
    /// "Show More LLMs"
    ShowMore,
    /// "I Have Preferences"
    Preferences,
    /// "Related Tools"
    Tools,
    /// "More Tools"
    MoreTools,
    /// "Hugging Face Models"
    Huggingface,
    /// "Done"
    Done,
}

/// Events that trigger stage transitions.
///
/// The first three originate from the user; the rest are completions of
/// effects fed back into the machine by the runtime.
#[derive(Debug, Clone)]
pub enum Event {
    /// Conversation became active (created or opened fresh)
    Opened,
    /// Free text typed by the user
    UserText(String),
    /// A card button click
    Action(CardAction),
    /// Classification finished. Total: the keyword fallback cannot fail.
    Classified { category: String },
    /// A slice of the LLM catalog. Empty when exhausted.
    LlmBatch { models: Vec<LlmRecord> },
    /// A slice of the tool catalog. Empty when exhausted.
    ToolBatch { tools: Vec<ToolRecord> },
    /// Chat relay reply
    ChatReply { text: String },
    /// Chat relay failed; a fixed apology is emitted
    ChatFailed,
}
