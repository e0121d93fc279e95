//! HTTP API
//!
//! Thin axum layer over the session runtime. Conversation routes are
//! scoped under the owning user; `/api/classify` stands alone and serves
//! both one-shot classification and stateless chat.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::catalog::Catalog;
use crate::classifier::Classifier;
use crate::db::Store;
use crate::llm::{ChatService, RetryPolicy};
use crate::session::SessionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub classifier: Arc<Classifier>,
    pub chat: Option<Arc<dyn ChatService>>,
    pub policy: RetryPolicy,
}

impl AppState {
    pub fn new(store: Store, catalog: Arc<Catalog>, chat: Option<Arc<dyn ChatService>>) -> Self {
        let classifier = Arc::new(Classifier::new(chat.clone()));
        Self {
            sessions: Arc::new(SessionManager::new(
                store,
                catalog,
                classifier.clone(),
                chat.clone(),
            )),
            classifier,
            chat,
            policy: RetryPolicy::default(),
        }
    }
}
