//! HTTP API for CircuitsAI

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::chat::ChatOrchestrator;
use crate::config::{EnvProviderConfigs, ServerConfig};
use crate::conversation::ConversationStore;
use crate::provider::AdapterFactory;
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub providers: EnvProviderConfigs,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_providers(config.providers.clone())
    }

    fn with_providers(providers: EnvProviderConfigs) -> Self {
        let store = Arc::new(ConversationStore::default());
        let factory = Arc::new(AdapterFactory::default());
        let orchestrator = Arc::new(ChatOrchestrator::new(store, factory, providers.clone()));
        Self {
            orchestrator,
            providers,
            started_at: Instant::now(),
        }
    }

    /// State with no environment-configured providers
    #[cfg(test)]
    pub fn test_state() -> Self {
        Self::with_providers(EnvProviderConfigs::default())
    }
}
