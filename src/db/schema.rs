//! Store schema and record types

use crate::catalog::{LlmRecord, ToolRecord};
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS conversations (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_conversations_user
    ON conversations(user_id, created_at);

CREATE TABLE IF NOT EXISTS messages (
    id TEXT PRIMARY KEY,
    conversation_id TEXT NOT NULL,
    sequence_id INTEGER NOT NULL,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL,

    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_messages_sequence
    ON messages(conversation_id, sequence_id);
";

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Ai => "ai",
        }
    }

    /// Rows store "ai", but "assistant" (the provider vocabulary) also
    /// reads back as assistant-authored so authorship never flips when
    /// history is relayed.
    pub fn parse(s: &str) -> Self {
        match s {
            "ai" | "assistant" => Role::Ai,
            _ => Role::User,
        }
    }
}

/// Message content, decoded once at the store boundary.
///
/// Recommendation cards are first-class variants rather than JSON probed
/// out of a text field; the `type` tag distinguishes them on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    PlainText {
        text: String,
    },
    LlmSuggestions {
        category: String,
        models: Vec<LlmRecord>,
    },
    ToolSuggestions {
        category: String,
        tools: Vec<ToolRecord>,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        MessageContent::PlainText { text: text.into() }
    }

    /// Rendering used when forwarding history to the chat relay: plain
    /// text passes through, cards are forwarded as their JSON encoding.
    pub fn as_relay_text(&self) -> String {
        match self {
            MessageContent::PlainText { text } => text.clone(),
            other => serde_json::to_string(other).unwrap_or_default(),
        }
    }
}

/// A message in a conversation log. Immutable once appended; ordering is
/// append order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
    /// Milliseconds since the epoch
    pub timestamp: i64,
}

/// Conversation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    /// Milliseconds since the epoch
    pub created_at: i64,
}
