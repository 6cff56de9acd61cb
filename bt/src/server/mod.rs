//! HTTP server
//!
//! JSON API over the assistant and the state manager, plus the static web UI.

mod error;
mod handlers;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use eyre::{Context, Result};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

pub use error::ApiError;
pub use handlers::{ChatRequest, ChatResponse, ParseResponse, SaveTodoRequest};

use crate::assistant::BaAssistant;
use crate::config::ServerConfig;
use crate::parser::SectionParser;
use crate::state::StateManager;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<BaAssistant>,
    pub store: StateManager,
    pub parser: Arc<SectionParser>,
}

impl AppState {
    pub fn new(assistant: BaAssistant, store: StateManager) -> Self {
        Self {
            assistant: Arc::new(assistant),
            store,
            parser: Arc::new(SectionParser::new()),
        }
    }
}

/// Build the HTTP router
///
/// Files under `static_dir` are served for any path no API route matches.
/// A missing directory is skipped.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/chat/plain", post(handlers::chat_plain))
        .route("/api/parse", post(handlers::parse))
        .route("/api/accept", post(handlers::accept_new))
        .route("/api/todos", post(handlers::create_todo).get(handlers::list_todos))
        .route("/api/todos/{id}", get(handlers::get_todo))
        .route("/api/todos/{id}/accept", post(handlers::accept_todo))
        .route("/api/chats", get(handlers::list_chats))
        .route("/api/sync", post(handlers::sync))
        .with_state(state);

    let router = match static_dir.filter(|dir| dir.is_dir()) {
        Some(dir) => {
            debug!(static_dir = %dir.display(), "build_router: serving static files");
            router.fallback_service(ServeDir::new(dir))
        }
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let app = build_router(state, Some(&config.static_dir));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;
    info!("BA Todo server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("BA Todo server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
