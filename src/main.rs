//! CircuitsAI - circuit design assistant server
//!
//! A Rust backend that relays chat turns to configurable LLM providers and
//! mines the replies for ASCII circuit diagrams, component lists and BOM
//! tables.

mod api;
mod chat;
mod config;
mod conversation;
mod extract;
mod prompt;
mod provider;

use api::{create_router, AppState};
use config::ServerConfig;
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "circuitsai=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ServerConfig::from_env();

    let configured = config.providers.configured_providers();
    if configured.is_empty() {
        tracing::warn!(
            "No provider API keys configured. Requests must carry their own \
             credentials, or use the mock provider."
        );
    } else {
        tracing::info!(providers = ?configured, "environment provider credentials loaded");
    }

    let state = AppState::new(&config);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("CircuitsAI server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
