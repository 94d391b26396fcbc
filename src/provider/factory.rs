//! Adapter factory with a bounded per-config cache
//!
//! Resolves catalog defaults, validates the config, instantiates the right
//! adapter variant and caches it by `provider+url+model`. The cache is
//! constructor-injected state, not a module global, and is bounded
//! (oldest-inserted entries drop first) rather than growing for the process
//! lifetime.

use super::claude::ClaudeService;
use super::custom::CustomService;
use super::gemini::GeminiService;
use super::mock::MockService;
use super::openai::OpenAiService;
use super::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES};
use super::{
    LoggingService, ProviderConfig, ProviderError, ProviderId, ProviderInfo, ProviderService,
    RetryService,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Static catalog of supported providers for UI population
pub fn supported_providers() -> &'static [ProviderInfo] {
    &[
        ProviderInfo {
            id: ProviderId::OpenAi,
            name: "OpenAI",
            default_url: "https://api.openai.com/v1/chat/completions",
            default_model: "gpt-4o-mini",
            description: "OpenAI GPT chat completions",
        },
        ProviderInfo {
            id: ProviderId::Claude,
            name: "Anthropic Claude",
            default_url: "https://api.anthropic.com/v1/messages",
            default_model: "claude-3-5-haiku-20241022",
            description: "Anthropic messages API",
        },
        ProviderInfo {
            id: ProviderId::Gemini,
            name: "Google Gemini",
            default_url: "https://generativelanguage.googleapis.com/v1beta/models",
            default_model: "gemini-1.5-flash",
            description: "Google generateContent API",
        },
        ProviderInfo {
            id: ProviderId::Deepseek,
            name: "DeepSeek",
            default_url: "https://api.deepseek.com/v1/chat/completions",
            default_model: "deepseek-chat",
            description: "DeepSeek chat (OpenAI-compatible)",
        },
        ProviderInfo {
            id: ProviderId::Moonshot,
            name: "Moonshot",
            default_url: "https://api.moonshot.cn/v1/chat/completions",
            default_model: "moonshot-v1-8k",
            description: "Moonshot Kimi chat (OpenAI-compatible)",
        },
        ProviderInfo {
            id: ProviderId::Custom,
            name: "Custom endpoint",
            default_url: "",
            default_model: "",
            description: "Bring-your-own OpenAI/Claude-compatible endpoint",
        },
        ProviderInfo {
            id: ProviderId::Mock,
            name: "Mock",
            default_url: "",
            default_model: "mock-circuit-designer",
            description: "Deterministic canned responses, no network",
        },
    ]
}

struct CachedAdapter {
    config: ProviderConfig,
    service: Arc<dyn ProviderService>,
}

#[derive(Default)]
struct FactoryCache {
    adapters: HashMap<String, CachedAdapter>,
    insertion_order: VecDeque<String>,
}

/// Creates and caches provider adapters
pub struct AdapterFactory {
    cache: Mutex<FactoryCache>,
    capacity: usize,
}

impl Default for AdapterFactory {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl AdapterFactory {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: Mutex::new(FactoryCache::default()),
            capacity: capacity.max(1),
        }
    }

    /// Resolve, validate and instantiate (or fetch from cache) the adapter
    /// for `config`. Validation failures surface before any network I/O.
    pub fn create(&self, config: &ProviderConfig) -> Result<Arc<dyn ProviderService>, ProviderError> {
        let config = resolve_defaults(config.clone());
        validate(&config)?;

        let key = config.cache_key();
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        if let Some(entry) = cache.adapters.get(&key) {
            if entry.config == config {
                return Ok(entry.service.clone());
            }
            // Same provider+url+model but changed key/headers/tunables:
            // rebuild and replace in place.
        }

        let service = build_service(&config)?;

        if !cache.adapters.contains_key(&key) {
            cache.insertion_order.push_back(key.clone());
            while cache.insertion_order.len() > self.capacity {
                if let Some(oldest) = cache.insertion_order.pop_front() {
                    cache.adapters.remove(&oldest);
                }
            }
        }
        cache.adapters.insert(
            key,
            CachedAdapter {
                config,
                service: service.clone(),
            },
        );

        Ok(service)
    }

    #[cfg(test)]
    fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .adapters
            .len()
    }
}

/// Fill empty URL/model fields from the catalog defaults
fn resolve_defaults(mut config: ProviderConfig) -> ProviderConfig {
    if config.api_url.is_empty() {
        if let Some(url) = config.provider.default_api_url() {
            config.api_url = url.to_string();
        }
    }
    if config.model.is_empty() {
        if let Some(model) = config.provider.default_model() {
            config.model = model.to_string();
        }
    }
    config
}

fn validate(config: &ProviderConfig) -> Result<(), ProviderError> {
    match config.provider {
        ProviderId::Mock => Ok(()),
        ProviderId::Custom => {
            let mut missing = Vec::new();
            if config.api_url.is_empty() {
                missing.push("apiUrl");
            }
            if config.api_key.is_empty() {
                missing.push("apiKey");
            }
            if config.model.is_empty() {
                missing.push("model");
            }
            if missing.is_empty() {
                Ok(())
            } else {
                Err(ProviderError::invalid_request(format!(
                    "custom provider config missing required fields: {}",
                    missing.join(", ")
                )))
            }
        }
        _ => {
            if config.api_key.is_empty() {
                Err(ProviderError::invalid_request(format!(
                    "{} provider config missing apiKey",
                    config.provider
                )))
            } else {
                Ok(())
            }
        }
    }
}

fn build_service(config: &ProviderConfig) -> Result<Arc<dyn ProviderService>, ProviderError> {
    let inner: Arc<dyn ProviderService> = match config.provider {
        ProviderId::OpenAi | ProviderId::Deepseek | ProviderId::Moonshot => {
            Arc::new(OpenAiService::new(config.clone())?)
        }
        ProviderId::Claude => Arc::new(ClaudeService::new(config.clone())?),
        ProviderId::Gemini => Arc::new(GeminiService::new(config.clone())?),
        ProviderId::Custom => Arc::new(CustomService::new(config.clone())?),
        ProviderId::Mock => Arc::new(MockService::new(config.model.clone())),
    };

    let max_retries = config.max_retries.unwrap_or(DEFAULT_MAX_RETRIES);
    let base_delay = config
        .retry_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_BASE_DELAY);

    let retrying = Arc::new(RetryService::new(inner, max_retries, base_delay));
    Ok(Arc::new(LoggingService::new(retrying)))
}
