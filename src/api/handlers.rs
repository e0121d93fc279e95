//! HTTP request handlers

use super::types::{
    ActionRequest, ConversationDetailResponse, ConversationListResponse,
    CreateConversationRequest, ErrorResponse, MessagesResponse, RenameRequest, SendTextRequest,
    SuccessResponse,
};
use super::AppState;
use crate::db::DbError;
use crate::llm::{complete_with_retry, normalize_role, ChatMessage};
use crate::session::{SessionError, SYSTEM_PROMPT};
use crate::stage::{Event, APOLOGY};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Classification and stateless chat
        .route("/api/classify", post(classify))
        // Conversation listing and creation
        .route(
            "/api/users/:user/conversations",
            get(list_conversations).post(create_conversation),
        )
        // Conversation retrieval
        .route("/api/users/:user/conversations/:id", get(get_conversation))
        // User inputs
        .route(
            "/api/users/:user/conversations/:id/message",
            post(send_text),
        )
        .route(
            "/api/users/:user/conversations/:id/action",
            post(send_action),
        )
        // Lifecycle
        .route(
            "/api/users/:user/conversations/:id/rename",
            post(rename_conversation),
        )
        .route(
            "/api/users/:user/conversations/:id/delete",
            post(delete_conversation),
        )
        .with_state(state)
}

// ============================================================
// Classification Endpoint
// ============================================================

/// Dual-mode endpoint: `{ prompt }` classifies one task description,
/// `{ messages }` relays a whole exchange to the chat upstream.
///
/// The body is decoded by hand so malformed JSON gets the fixed error
/// string instead of axum's rejection text.
async fn classify(State(state): State<AppState>, body: Bytes) -> Response {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid JSON payload")),
        )
            .into_response();
    };

    if let Some(prompt) = payload.get("prompt").and_then(Value::as_str) {
        let category = state.classifier.classify(prompt).await;
        return Json(json!({ "category": category })).into_response();
    }

    if let Some(messages) = payload.get("messages").and_then(Value::as_array) {
        return relay_chat(&state, messages).await;
    }

    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new("Must provide { prompt } or { messages }")),
    )
        .into_response()
}

async fn relay_chat(state: &AppState, raw: &[Value]) -> Response {
    let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT)];
    messages.extend(raw.iter().map(|entry| ChatMessage {
        role: normalize_role(entry.get("role").and_then(Value::as_str).unwrap_or("user")),
        content: entry
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }));

    let Some(chat) = &state.chat else {
        tracing::warn!("chat requested but no upstream service is configured");
        return unavailable();
    };
    match complete_with_retry(chat.as_ref(), &messages, &state.policy).await {
        Ok(text) => Json(json!({ "text": text })).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "chat upstream failed");
            unavailable()
        }
    }
}

fn unavailable() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "text": APOLOGY }))).into_response()
}

// ============================================================
// Conversation Listing and Creation
// ============================================================

async fn list_conversations(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<ConversationListResponse>, AppError> {
    let conversations = state.sessions.store().list_conversations(&user)?;
    Ok(Json(ConversationListResponse { conversations }))
}

/// Create a conversation and open it, so the response already carries the
/// welcome message.
async fn create_conversation(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(req): Json<CreateConversationRequest>,
) -> Result<Json<ConversationDetailResponse>, AppError> {
    let conversation = state.sessions.store().create_conversation(&user, &req.name)?;
    let messages = state
        .sessions
        .handle_event(&user, &conversation.id, Event::Opened)
        .await?;

    Ok(Json(ConversationDetailResponse {
        conversation,
        messages,
    }))
}

// ============================================================
// Conversation Retrieval
// ============================================================

async fn get_conversation(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, String)>,
) -> Result<Json<ConversationDetailResponse>, AppError> {
    let conversation = state.sessions.store().get_conversation(&user, &id)?;
    let messages = state.sessions.store().get_messages(&user, &id)?;

    Ok(Json(ConversationDetailResponse {
        conversation,
        messages,
    }))
}

// ============================================================
// User Inputs
// ============================================================

async fn send_text(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, String)>,
    Json(req): Json<SendTextRequest>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .sessions
        .handle_event(&user, &id, Event::UserText(req.text))
        .await?;
    Ok(Json(MessagesResponse { messages }))
}

async fn send_action(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, String)>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<MessagesResponse>, AppError> {
    let messages = state
        .sessions
        .handle_event(&user, &id, Event::Action(req.action))
        .await?;
    Ok(Json(MessagesResponse { messages }))
}

// ============================================================
// Lifecycle
// ============================================================

async fn rename_conversation(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, String)>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.store().rename_conversation(&user, &id, &req.name)?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path((user, id)): Path<(String, String)>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.store().delete_conversation(&user, &id)?;
    state.sessions.remove(&id).await;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConversationNotFound(_) => AppError::NotFound(err.to_string()),
            DbError::Sqlite(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, LlmRecord};
    use crate::classifier::Classifier;
    use crate::db::Store;
    use crate::llm::{ChatService, LlmError, LlmErrorKind, RetryPolicy};
    use crate::session::SessionManager;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct CannedChat(Result<&'static str, LlmErrorKind>);

    #[async_trait]
    impl ChatService for CannedChat {
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, LlmError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(kind) => Err(LlmError::new(kind, "down")),
            }
        }

        fn model_id(&self) -> &str {
            "canned"
        }
    }

    fn writing_llms(count: usize) -> Vec<LlmRecord> {
        (0..count)
            .map(|i| LlmRecord {
                title: format!("model-{i}"),
                link: String::new(),
                description: String::new(),
                task_type: "writing".to_string(),
                tags: vec![],
            })
            .collect()
    }

    fn router_without_upstream() -> Router {
        router_with_chat(None)
    }

    fn router_with_chat(chat: Option<Arc<dyn ChatService>>) -> Router {
        let store = Store::open_in_memory().unwrap();
        let catalog = Arc::new(Catalog::from_records(writing_llms(5), vec![]));
        let classifier = Arc::new(Classifier::new(None));
        let state = AppState {
            sessions: Arc::new(SessionManager::new(
                store,
                catalog,
                classifier.clone(),
                chat.clone(),
            )),
            classifier,
            chat,
            policy: RetryPolicy {
                max_attempts: 3,
                delay_unit: std::time::Duration::from_millis(1),
            },
        };
        create_router(state)
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn classify_rejects_malformed_json() {
        let app = router_without_upstream();
        let response = app
            .oneshot(post_json("/api/classify", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid JSON payload");
    }

    #[tokio::test]
    async fn classify_rejects_missing_fields() {
        let app = router_without_upstream();
        let response = app
            .oneshot(post_json("/api/classify", r#"{"other": 1}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Must provide { prompt } or { messages }");
    }

    #[tokio::test]
    async fn classify_prompt_uses_keyword_fallback_without_upstream() {
        let app = router_without_upstream();
        let response = app
            .oneshot(post_json(
                "/api/classify",
                r#"{"prompt": "summarize this document"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["category"], "Writing / Content Creation");
    }

    #[tokio::test]
    async fn classify_messages_relays_to_chat() {
        let app = router_with_chat(Some(Arc::new(CannedChat(Ok("hello back")))));
        let response = app
            .oneshot(post_json(
                "/api/classify",
                r#"{"messages": [{"role": "ai", "content": "hi"}, {"role": "user", "content": "hello"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["text"], "hello back");
    }

    #[tokio::test]
    async fn classify_messages_without_upstream_is_unavailable() {
        let app = router_without_upstream();
        let response = app
            .oneshot(post_json("/api/classify", r#"{"messages": []}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["text"], APOLOGY);
    }

    #[tokio::test]
    async fn classify_messages_upstream_failure_is_unavailable() {
        let app = router_with_chat(Some(Arc::new(CannedChat(Err(
            LlmErrorKind::ServerError,
        )))));
        let response = app
            .oneshot(post_json(
                "/api/classify",
                r#"{"messages": [{"role": "user", "content": "hi"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["text"], APOLOGY);
    }

    #[tokio::test]
    async fn guided_flow_over_http_yields_capped_cards() {
        let app = router_without_upstream();

        let created = app
            .clone()
            .oneshot(post_json(
                "/api/users/alice/conversations",
                r#"{"name": "Chat 1"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::OK);
        let created = body_json(created).await;
        let id = created["conversation"]["id"].as_str().unwrap().to_string();
        // Opening appended the welcome message
        assert_eq!(created["messages"].as_array().unwrap().len(), 1);

        let base = format!("/api/users/alice/conversations/{id}");
        app.clone()
            .oneshot(post_json(&format!("{base}/message"), r#"{"text": "yes"}"#))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(post_json(
                &format!("{base}/message"),
                r#"{"text": "help me write a blog post"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let messages = body["messages"].as_array().unwrap();
        // User echo plus one recommendation card of at most 3 models
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["content"]["type"], "llm_suggestions");
        assert_eq!(
            messages[1]["content"]["category"],
            "Writing / Content Creation"
        );
        assert_eq!(messages[1]["content"]["models"].as_array().unwrap().len(), 3);

        // Cards survive retrieval with their structure intact
        let fetched = app
            .clone()
            .oneshot(Request::get(base.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let fetched = body_json(fetched).await;
        let log = fetched["messages"].as_array().unwrap();
        assert_eq!(log.last().unwrap()["content"]["type"], "llm_suggestions");
    }

    #[tokio::test]
    async fn show_more_action_advances_the_catalog() {
        let app = router_without_upstream();

        let created = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/users/alice/conversations",
                    r#"{"name": "Chat 1"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        let id = created["conversation"]["id"].as_str().unwrap().to_string();
        let base = format!("/api/users/alice/conversations/{id}");

        app.clone()
            .oneshot(post_json(&format!("{base}/message"), r#"{"text": "yes"}"#))
            .await
            .unwrap();
        app.clone()
            .oneshot(post_json(
                &format!("{base}/message"),
                r#"{"text": "write a poem"}"#,
            ))
            .await
            .unwrap();

        let more = body_json(
            app.clone()
                .oneshot(post_json(
                    &format!("{base}/action"),
                    r#"{"action": "show_more"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        let messages = more["messages"].as_array().unwrap();
        // 5 matching records total, 3 already shown
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"]["models"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn conversations_are_scoped_per_user_over_http() {
        let app = router_without_upstream();

        let created = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/users/alice/conversations",
                    r#"{"name": "Private"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        let id = created["conversation"]["id"].as_str().unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/api/users/bob/conversations/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn rename_and_delete_lifecycle() {
        let app = router_without_upstream();

        let created = body_json(
            app.clone()
                .oneshot(post_json(
                    "/api/users/alice/conversations",
                    r#"{"name": "Chat 1"}"#,
                ))
                .await
                .unwrap(),
        )
        .await;
        let id = created["conversation"]["id"].as_str().unwrap().to_string();
        let base = format!("/api/users/alice/conversations/{id}");

        let renamed = app
            .clone()
            .oneshot(post_json(
                &format!("{base}/rename"),
                r#"{"name": "Planning"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(renamed.status(), StatusCode::OK);

        let listed = body_json(
            app.clone()
                .oneshot(
                    Request::get("/api/users/alice/conversations")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(listed["conversations"][0]["name"], "Planning");

        let deleted = app
            .clone()
            .oneshot(post_json(&format!("{base}/delete"), "{}"))
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let gone = app
            .clone()
            .oneshot(Request::get(base.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    }
}
