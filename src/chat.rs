//! Chat orchestration
//!
//! Ties the pieces together for one turn: resolve the conversation, record
//! the user message, resolve a usable provider config, build the system
//! prompt, call the adapter, record the reply, run extraction. One typed
//! error enum end to end; the HTTP layer maps it to status codes.

use crate::config::EnvProviderConfigs;
use crate::conversation::{ConversationContext, ConversationStore, StoreError};
use crate::extract::{extract, Extraction};
use crate::prompt::build_system_prompt;
use crate::provider::{
    AdapterFactory, ChatMessage, ChatOptions, KeyValidation, ProviderConfig, ProviderError,
    ProviderErrorKind, ProviderId,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// How many trailing conversation messages accompany each provider call
const HISTORY_WINDOW: usize = 10;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no usable provider configuration: supply one in the request or set a provider API key in the environment")]
    NoConfig,
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Everything one successful chat turn produced
#[derive(Debug)]
pub struct ChatOutcome {
    pub conversation_id: String,
    pub reply: String,
    pub provider: ProviderId,
    pub model: String,
    pub context: ConversationContext,
    pub extraction: Extraction,
}

/// Result of probing a caller-supplied provider config
#[derive(Debug)]
pub struct TestOutcome {
    pub provider: ProviderId,
    pub model: String,
    pub validation: KeyValidation,
    pub latency_ms: u64,
    pub reply_preview: Option<String>,
}

/// Stateless orchestrator over injected shared state
pub struct ChatOrchestrator {
    store: Arc<ConversationStore>,
    factory: Arc<AdapterFactory>,
    env_providers: EnvProviderConfigs,
}

impl ChatOrchestrator {
    pub fn new(
        store: Arc<ConversationStore>,
        factory: Arc<AdapterFactory>,
        env_providers: EnvProviderConfigs,
    ) -> Self {
        Self {
            store,
            factory,
            env_providers,
        }
    }

    /// Run one chat turn
    pub async fn chat(
        &self,
        message: &str,
        conversation_id: Option<&str>,
        requested_config: Option<ProviderConfig>,
    ) -> Result<ChatOutcome, ChatError> {
        let conversation_id = self.store.ensure(conversation_id);
        self.store
            .add_message(&conversation_id, crate::provider::MessageRole::User, message)?;
        let context = self
            .store
            .context(&conversation_id)
            .unwrap_or_default();

        let config = self.resolve_config(requested_config)?;
        let adapter = self.factory.create(&config)?;

        let system_prompt = build_system_prompt(message, &context);
        let mut messages = vec![ChatMessage::system(system_prompt)];
        for m in self.store.messages(&conversation_id, HISTORY_WINDOW) {
            messages.push(ChatMessage {
                role: m.role,
                content: m.content,
            });
        }

        let options = ChatOptions {
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };
        let reply = adapter.chat(&messages, &options).await?;

        self.store.add_message(
            &conversation_id,
            crate::provider::MessageRole::Assistant,
            reply.clone(),
        )?;

        let extraction = extract(&reply);
        tracing::debug!(
            conversation = %conversation_id,
            circuit = extraction.circuit.method().unwrap_or("none"),
            bom = extraction.bom.method().unwrap_or("none"),
            description = extraction.description.method().unwrap_or("none"),
            "extraction finished"
        );

        Ok(ChatOutcome {
            conversation_id,
            reply,
            provider: adapter.provider_id(),
            model: adapter.model_id().to_string(),
            context,
            extraction,
        })
    }

    /// Probe a caller-supplied config with one short completion.
    /// Probes are never retried: a dead endpoint answers within the connect
    /// timeout instead of sitting through backoff sleeps.
    pub async fn test_config(&self, config: &ProviderConfig) -> Result<TestOutcome, ChatError> {
        let mut probe_config = config.clone();
        probe_config.max_retries = Some(1);
        let adapter = self.factory.create(&probe_config)?;
        let probe = [ChatMessage::user("请回复：连接正常")];
        let options = ChatOptions {
            max_tokens: Some(32),
            temperature: Some(0.0),
        };

        let start = Instant::now();
        let result = adapter.chat(&probe, &options).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let (validation, reply_preview) = match result {
            Ok(text) => {
                let preview: String = text.chars().take(120).collect();
                (KeyValidation::Valid, Some(preview))
            }
            Err(e) => match e.kind {
                ProviderErrorKind::Network => {
                    (KeyValidation::Unreachable { reason: e.message }, None)
                }
                _ => (KeyValidation::Invalid { reason: e.message }, None),
            },
        };

        Ok(TestOutcome {
            provider: adapter.provider_id(),
            model: adapter.model_id().to_string(),
            validation,
            latency_ms,
            reply_preview,
        })
    }

    /// Caller config wins when minimally valid; otherwise fall back to the
    /// environment (requested provider first, then any configured one).
    fn resolve_config(
        &self,
        requested: Option<ProviderConfig>,
    ) -> Result<ProviderConfig, ChatError> {
        if let Some(config) = requested {
            if config.is_minimally_valid() {
                return Ok(config);
            }
            if let Some(env) = self.env_providers.for_provider(config.provider) {
                tracing::debug!(
                    provider = %config.provider,
                    "request config incomplete, using environment credentials"
                );
                return Ok(env);
            }
        }
        self.env_providers
            .first_available()
            .ok_or(ChatError::NoConfig)
    }
}
