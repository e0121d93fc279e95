//! Compass - guided LLM and tool recommendations
//!
//! A chat-style backend that classifies a user's task, walks them through
//! catalog recommendations with a conversation stage machine, and persists
//! each conversation per user.

mod api;
mod catalog;
mod classifier;
mod db;
mod llm;
mod session;
mod stage;

use api::{create_router, AppState};
use catalog::Catalog;
use db::Store;
use llm::{ChatService, GroqService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "compass=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let db_path = std::env::var("COMPASS_DB_PATH").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        format!("{home}/.compass/compass.db")
    });

    let port: u16 = std::env::var("COMPASS_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    let data_dir = std::env::var("COMPASS_DATA_DIR").unwrap_or_else(|_| "data".to_string());

    // Ensure database directory exists
    if let Some(parent) = PathBuf::from(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }

    tracing::info!(path = %db_path, "Opening store");
    let store = Store::open(&db_path)?;

    // Load the recommendation catalogs
    tracing::info!(dir = %data_dir, "Loading catalogs");
    let catalog = Arc::new(Catalog::load(std::path::Path::new(&data_dir)));

    // Chat upstream; without a key the classifier falls back to keywords
    // and chat requests get the fixed apology.
    let chat: Option<Arc<dyn ChatService>> = match std::env::var("GROQ_API_KEY") {
        Ok(key) if !key.is_empty() => {
            let base_url = std::env::var("GROQ_BASE_URL").ok();
            let service = GroqService::new(key, base_url.as_deref());
            tracing::info!(model = %service.model_id(), "Chat upstream initialized");
            Some(Arc::new(service))
        }
        _ => {
            tracing::warn!("No GROQ_API_KEY configured. Running with keyword fallback only.");
            None
        }
    };

    let state = AppState::new(store, catalog, chat);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Compass server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
