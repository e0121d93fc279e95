//! Conversation store
//!
//! Hierarchical ownership: user -> conversations -> messages, mirroring the
//! `users/{user}/conversations/{id}` document layout. Appending a message
//! is a single `INSERT` under the connection lock, so two sessions
//! appending to the same conversation both land; there is no
//! read-modify-write of a whole message array.

mod schema;

pub use schema::*;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe store handle
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Conversation Operations ====================

    /// Create a new conversation for a user
    pub fn create_conversation(&self, user_id: &str, name: &str) -> DbResult<Conversation> {
        let conn = self.conn.lock().unwrap();
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();

        conn.execute(
            "INSERT INTO conversations (id, user_id, name, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![id, user_id, name, now],
        )?;

        Ok(Conversation {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    /// List a user's conversations, oldest first
    pub fn list_conversations(&self, user_id: &str) -> DbResult<Vec<Conversation>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at FROM conversations
             WHERE user_id = ?1 ORDER BY created_at",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            Ok(Conversation {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Get one of a user's conversations by id
    pub fn get_conversation(&self, user_id: &str, id: &str) -> DbResult<Conversation> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, created_at FROM conversations
             WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
            |row| {
                Ok(Conversation {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => DbError::ConversationNotFound(id.to_string()),
            other => DbError::Sqlite(other),
        })
    }

    /// Rename a conversation
    pub fn rename_conversation(&self, user_id: &str, id: &str, name: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE conversations SET name = ?1 WHERE id = ?2 AND user_id = ?3",
            params![name, id, user_id],
        )?;

        if updated == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a conversation and all its messages
    pub fn delete_conversation(&self, user_id: &str, id: &str) -> DbResult<()> {
        let conn = self.conn.lock().unwrap();

        // Messages are deleted by CASCADE
        let deleted = conn.execute(
            "DELETE FROM conversations WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;

        if deleted == 0 {
            return Err(DbError::ConversationNotFound(id.to_string()));
        }
        Ok(())
    }

    // ==================== Message Operations ====================

    /// Append a message to a conversation. Atomic: the sequence number is
    /// assigned and the row inserted under the same connection lock.
    pub fn append_message(
        &self,
        user_id: &str,
        conversation_id: &str,
        role: Role,
        content: &MessageContent,
    ) -> DbResult<Message> {
        let conn = self.conn.lock().unwrap();

        let owned: Option<String> = conn
            .query_row(
                "SELECT id FROM conversations WHERE id = ?1 AND user_id = ?2",
                params![conversation_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(DbError::ConversationNotFound(conversation_id.to_string()));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().timestamp_millis();
        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM messages WHERE conversation_id = ?1",
            params![conversation_id],
            |row| row.get(0),
        )?;
        let encoded = serde_json::to_string(content).map_err(|e| {
            DbError::Sqlite(rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        })?;

        conn.execute(
            "INSERT INTO messages (id, conversation_id, sequence_id, role, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, conversation_id, sequence_id, role.as_str(), encoded, now],
        )?;

        Ok(Message {
            id,
            role,
            content: content.clone(),
            timestamp: now,
        })
    }

    /// Get all messages for a conversation in append order
    pub fn get_messages(&self, user_id: &str, conversation_id: &str) -> DbResult<Vec<Message>> {
        let conn = self.conn.lock().unwrap();

        let owned: Option<String> = conn
            .query_row(
                "SELECT id FROM conversations WHERE id = ?1 AND user_id = ?2",
                params![conversation_id, user_id],
                |row| row.get(0),
            )
            .optional()?;
        if owned.is_none() {
            return Err(DbError::ConversationNotFound(conversation_id.to_string()));
        }

        let mut stmt = conn.prepare(
            "SELECT id, role, content, created_at FROM messages
             WHERE conversation_id = ?1 ORDER BY sequence_id",
        )?;

        let rows = stmt.query_map(params![conversation_id], |row| {
            let raw: String = row.get(2)?;
            // Content that fails to decode (legacy rows) degrades to plain text
            let content = serde_json::from_str(&raw)
                .unwrap_or(MessageContent::PlainText { text: raw });
            Ok(Message {
                id: row.get(0)?,
                role: Role::parse(row.get::<_, String>(1)?.as_str()),
                content,
                timestamp: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }
}
