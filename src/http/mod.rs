//! HTTP server with Server-Sent Events.
//!
//! POST endpoints run the paper tools through the [`Dispatcher`], which
//! reports progress to the [`EventHub`]; `GET /events` streams those events
//! to connected clients. The hub lives in [`AppState`], so every router
//! built from a fresh state has its own event relay.

mod dispatch;
mod error;
mod routes;
pub mod sse;

pub use dispatch::Dispatcher;
pub use error::ApiError;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::events::EventHub;
use crate::mcp::{PromptRegistry, ToolRegistry};

/// Shared state of the HTTP server
#[derive(Debug, Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub tools: ToolRegistry,
    pub prompts: Arc<PromptRegistry>,
    pub hub: EventHub,
    pub dispatcher: Dispatcher,
}

impl AppState {
    /// Build the state with a fresh event hub tuned by `settings.events`
    pub fn new(settings: Settings, tools: ToolRegistry) -> Self {
        let hub = EventHub::new(settings.events.delivery, settings.events.capacity);
        let dispatcher = Dispatcher::new(tools.clone(), hub.clone());
        Self {
            settings: Arc::new(settings),
            tools,
            prompts: Arc::new(PromptRegistry::new()),
            hub,
            dispatcher,
        }
    }
}

/// All endpoints, with permissive CORS and request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/events", get(sse::events))
        .route("/tools", get(routes::list_tools))
        .route("/tools/{name}", post(routes::call_tool))
        .route("/prompts", get(routes::list_prompts))
        .route("/prompts/{name}", get(routes::get_prompt))
        .route("/search", post(routes::search))
        .route("/download", post(routes::download))
        .route("/list", post(routes::list))
        .route("/read", post(routes::read))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `settings.server` and serve until Ctrl-C
pub async fn serve(state: AppState) -> std::io::Result<()> {
    let addr = state.settings.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "arXiv MCP HTTP server listening on {} (events at /events)",
        listener.local_addr()?
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down HTTP server"),
        Err(e) => {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
