//! Session runtime
//!
//! Owns the in-memory stage state for each open conversation and
//! interprets the effects produced by the pure transition function.
//! Handling of one inbound event runs to quiescence under a
//! per-conversation lock, so interleaved submissions cannot apply updates
//! against stale state.

use crate::catalog::Catalog;
use crate::classifier::Classifier;
use crate::db::{DbError, Message, Role, Store};
use crate::llm::{complete_with_retry, ChatMessage, ChatService, RetryPolicy};
use crate::stage::{transition, Effect, Event, Session};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// System prompt prepended to every chat-relay request
pub const SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] DbError),
}

/// Manager for all open conversation sessions
pub struct SessionManager {
    store: Store,
    catalog: Arc<Catalog>,
    classifier: Arc<Classifier>,
    chat: Option<Arc<dyn ChatService>>,
    policy: RetryPolicy,
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionManager {
    pub fn new(
        store: Store,
        catalog: Arc<Catalog>,
        classifier: Arc<Classifier>,
        chat: Option<Arc<dyn ChatService>>,
    ) -> Self {
        Self {
            store,
            catalog,
            classifier,
            chat,
            policy: RetryPolicy::default(),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    async fn session_handle(&self, conversation_id: &str) -> Arc<Mutex<Session>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Session::new())))
            .clone()
    }

    /// Drop the in-memory session for a deleted conversation
    pub async fn remove(&self, conversation_id: &str) {
        self.sessions.lock().await.remove(conversation_id);
    }

    /// Handle one inbound event for a conversation.
    ///
    /// Runs the transition function, interprets the resulting effects, and
    /// feeds completion events back in until the queue drains. Returns
    /// every message appended while handling the event, in append order.
    pub async fn handle_event(
        &self,
        user_id: &str,
        conversation_id: &str,
        event: Event,
    ) -> Result<Vec<Message>, SessionError> {
        // Ownership check up front: a rejected request leaves the owner's
        // stage and the session map untouched.
        self.store.get_conversation(user_id, conversation_id)?;

        let handle = self.session_handle(conversation_id).await;
        let mut session = handle.lock().await;

        let mut appended = Vec::new();
        let mut queue = VecDeque::from([event]);
        while let Some(event) = queue.pop_front() {
            let result = transition(&session, event);
            *session = result.session;
            for effect in result.effects {
                self.run_effect(user_id, conversation_id, effect, &mut appended, &mut queue)
                    .await?;
            }
        }

        Ok(appended)
    }

    async fn run_effect(
        &self,
        user_id: &str,
        conversation_id: &str,
        effect: Effect,
        appended: &mut Vec<Message>,
        queue: &mut VecDeque<Event>,
    ) -> Result<(), SessionError> {
        match effect {
            Effect::Append { role, content } => {
                let message = self
                    .store
                    .append_message(user_id, conversation_id, role, &content)?;
                appended.push(message);
            }
            Effect::Classify { prompt } => {
                let category = self.classifier.classify(&prompt).await;
                tracing::info!(conversation = conversation_id, category, "prompt classified");
                queue.push_back(Event::Classified { category });
            }
            Effect::FetchLlmBatch { category, offset } => {
                queue.push_back(Event::LlmBatch {
                    models: self.catalog.llm_page(&category, offset),
                });
            }
            Effect::FetchToolBatch { category, offset } => {
                queue.push_back(Event::ToolBatch {
                    tools: self.catalog.tool_page(&category, offset),
                });
            }
            Effect::RelayPrompt { prompt } => {
                let messages = vec![
                    ChatMessage::system(SYSTEM_PROMPT),
                    ChatMessage::user(prompt),
                ];
                queue.push_back(self.relay(&messages).await);
            }
            Effect::RelayHistory => {
                let history = self.store.get_messages(user_id, conversation_id)?;
                let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
                messages.extend(history.iter().map(|m| match m.role {
                    Role::User => ChatMessage::user(m.content.as_relay_text()),
                    Role::Ai => ChatMessage::assistant(m.content.as_relay_text()),
                }));
                queue.push_back(self.relay(&messages).await);
            }
        }
        Ok(())
    }

    async fn relay(&self, messages: &[ChatMessage]) -> Event {
        let Some(chat) = &self.chat else {
            tracing::warn!("chat relay requested but no upstream service is configured");
            return Event::ChatFailed;
        };
        match complete_with_retry(chat.as_ref(), messages, &self.policy).await {
            Ok(text) => Event::ChatReply { text },
            Err(err) => {
                tracing::error!(error = %err, "chat relay failed");
                Event::ChatFailed
            }
        }
    }
}
