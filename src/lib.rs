//! # Aide - multi-agent chat service
//!
//! A supervisor model reads the conversation and routes each request to one
//! of three workers, or ends the run:
//!
//! - **researcher**: web search, page scraping and sandboxed file writes
//! - **vision_agent**: answers questions about an attached image
//! - **rag_agent**: answers from a vector-indexed document collection
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aide::adapters::secrets::Secrets;
//! use aide::agents::{ChatRequest, ChatService};
//! use aide::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_file("aide.toml")?;
//!     let secrets = Secrets::from_env(settings.credential_names());
//!     let service = ChatService::from_settings(&settings, &secrets)?;
//!
//!     let reply = service.chat(ChatRequest::new("What changed in Rust 1.80?")).await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: tool and auth types shared across layers
//! - **Agents**: supervisor, workers and the dispatch state machine
//! - **Adapters**: HTTP handlers, middleware and external tool clients
//! - **Config**: layered configuration and validation

pub mod adapters;
pub mod agents;
pub mod cli;
pub mod config;
pub mod domain;

use crate::adapters::auth_middleware::{auth_middleware, AuthMiddleware};
use crate::adapters::chat_handler::{self, ChatState};
use crate::adapters::health_handler::HealthHandler;
use crate::agents::handler::ChatService;
use crate::config::Settings;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates the Axum application router with all endpoints configured.
///
/// `/`, `/health`, `/health/ready` and `/health/live` are public. `/chat`
/// and `/agents` sit behind the rate limiter and authentication when those
/// are enabled in `settings`.
pub fn create_app(chat: Arc<ChatService>, settings: &Settings) -> Router {
    let health_handler = Arc::new(HealthHandler::new(
        chat.agents().iter().map(|agent| agent.name),
    ));

    // Public routes (no authentication required)
    let public_router = Router::new()
        .route("/", get(chat_handler::root))
        .route("/health", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.health().await }
            }
        }))
        .route("/health/ready", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.ready().await }
            }
        }))
        .route("/health/live", get({
            let handler = health_handler.clone();
            move || {
                let h = handler.clone();
                async move { h.live().await }
            }
        }));

    let mut protected_router = Router::new()
        .route("/chat", post(chat_handler::chat))
        .route("/agents", get(chat_handler::list_agents))
        .with_state(ChatState { chat });

    if let Some(rate_limit) = &settings.rate_limit {
        if rate_limit.enabled {
            let limiter = crate::adapters::rate_limit::create_limiter(
                rate_limit.requests_per_second,
                rate_limit.burst_size,
            );

            protected_router = protected_router.layer(axum::middleware::from_fn_with_state(
                limiter,
                crate::adapters::rate_limit::rate_limit_middleware,
            ));
        }
    }

    // Added last so it runs before the rate limiter
    if settings.auth.enabled {
        let auth = Arc::new(AuthMiddleware::new(Arc::new(settings.auth.clone())));
        protected_router =
            protected_router.layer(axum::middleware::from_fn_with_state(auth, auth_middleware));
    }

    public_router
        .merge(protected_router)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
}
