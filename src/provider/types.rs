//! Common types for provider interactions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Known provider identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    OpenAi,
    Claude,
    Gemini,
    Custom,
    Mock,
    Deepseek,
    Moonshot,
}

impl ProviderId {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Claude => "claude",
            ProviderId::Gemini => "gemini",
            ProviderId::Custom => "custom",
            ProviderId::Mock => "mock",
            ProviderId::Deepseek => "deepseek",
            ProviderId::Moonshot => "moonshot",
        }
    }

    /// Default endpoint when the caller supplies none. Custom has no default
    /// by design; mock never performs network I/O.
    pub fn default_api_url(self) -> Option<&'static str> {
        match self {
            ProviderId::OpenAi => Some("https://api.openai.com/v1/chat/completions"),
            ProviderId::Claude => Some("https://api.anthropic.com/v1/messages"),
            ProviderId::Gemini => Some("https://generativelanguage.googleapis.com/v1beta/models"),
            ProviderId::Deepseek => Some("https://api.deepseek.com/v1/chat/completions"),
            ProviderId::Moonshot => Some("https://api.moonshot.cn/v1/chat/completions"),
            ProviderId::Custom | ProviderId::Mock => None,
        }
    }

    pub fn default_model(self) -> Option<&'static str> {
        match self {
            ProviderId::OpenAi => Some("gpt-4o-mini"),
            ProviderId::Claude => Some("claude-3-5-haiku-20241022"),
            ProviderId::Gemini => Some("gemini-1.5-flash"),
            ProviderId::Deepseek => Some("deepseek-chat"),
            ProviderId::Moonshot => Some("moonshot-v1-8k"),
            ProviderId::Mock => Some("mock-circuit-designer"),
            ProviderId::Custom => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire shape selection for the custom adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    OpenAi,
    Claude,
    Custom,
}

/// Per-request provider configuration, supplied by the caller or resolved
/// from environment fallbacks. Accepts both snake_case and the upstream
/// client's camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: ProviderId,
    #[serde(alias = "apiKey")]
    pub api_key: String,
    #[serde(alias = "apiUrl")]
    pub api_url: String,
    pub model: String,
    #[serde(alias = "maxTokens")]
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    #[serde(alias = "requestFormat")]
    pub request_format: Option<WireFormat>,
    #[serde(alias = "responseFormat")]
    pub response_format: Option<WireFormat>,
    #[serde(alias = "customHeaders")]
    pub custom_headers: HashMap<String, String>,
    #[serde(alias = "maxRetries")]
    pub max_retries: Option<u32>,
    #[serde(alias = "retryDelayMs")]
    pub retry_delay_ms: Option<u64>,
    /// Opt-in reproduction of the legacy client's disabled TLS verification.
    /// Verification stays on unless this is explicitly set.
    #[serde(alias = "dangerAcceptInvalidCerts")]
    pub danger_accept_invalid_certs: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::Mock,
            api_key: String::new(),
            api_url: String::new(),
            model: String::new(),
            max_tokens: None,
            temperature: None,
            request_format: None,
            response_format: None,
            custom_headers: HashMap::new(),
            max_retries: None,
            retry_delay_ms: None,
            danger_accept_invalid_certs: false,
        }
    }
}

impl ProviderConfig {
    /// Minimal validity check for caller-supplied configs: key, URL and
    /// provider must all be present. Mock needs neither key nor URL.
    pub fn is_minimally_valid(&self) -> bool {
        self.provider == ProviderId::Mock || (!self.api_key.is_empty() && !self.api_url.is_empty())
    }

    /// Adapter cache key: provider + URL + model
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.provider, self.api_url, self.model)
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// Provider-agnostic chat message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Tunables forwarded to the provider call
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Outcome of an API key validation probe. Expected failure modes are data,
/// not errors: every adapter reports through this one shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum KeyValidation {
    Valid,
    Invalid { reason: String },
    Unreachable { reason: String },
}

impl KeyValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, KeyValidation::Valid)
    }
}

/// Static provider metadata for UI population
#[derive(Debug, Clone, Serialize)]
pub struct ProviderInfo {
    pub id: ProviderId,
    pub name: &'static str,
    pub default_url: &'static str,
    pub default_model: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_config_accepts_camel_case_aliases() {
        let json = r#"{
            "provider": "deepseek",
            "apiKey": "sk-test",
            "apiUrl": "https://api.deepseek.com/v1/chat/completions",
            "model": "deepseek-chat",
            "maxTokens": 2048,
            "requestFormat": "openai"
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider, ProviderId::Deepseek);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.max_tokens, Some(2048));
        assert_eq!(config.request_format, Some(WireFormat::OpenAi));
        assert!(!config.danger_accept_invalid_certs);
    }

    #[test]
    fn mock_is_minimally_valid_without_credentials() {
        let config = ProviderConfig::default();
        assert!(config.is_minimally_valid());

        let incomplete = ProviderConfig {
            provider: ProviderId::OpenAi,
            ..Default::default()
        };
        assert!(!incomplete.is_minimally_valid());
    }

    #[test]
    fn cache_key_covers_provider_url_model() {
        let config = ProviderConfig {
            provider: ProviderId::OpenAi,
            api_url: "https://example.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        };
        assert_eq!(config.cache_key(), "openai:https://example.com/v1:gpt-4o");
    }
}
