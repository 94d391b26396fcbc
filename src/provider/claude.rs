//! Anthropic Claude provider implementation

use super::{
    build_client, classify_http_error, classify_send_error, parse_retry_after, ChatMessage,
    ChatOptions, MessageRole, ProviderConfig, ProviderError, ProviderId, ProviderService,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Claude service implementation
pub struct ClaudeService {
    client: Client,
    config: ProviderConfig,
}

impl ClaudeService {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Claude takes the system prompt as a top-level field; system messages
    /// are pulled out of the list and joined.
    fn translate_request(&self, messages: &[ChatMessage], options: &ChatOptions) -> ClaudeRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let turns: Vec<ClaudeMessage> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| ClaudeMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        ClaudeRequest {
            model: self.config.model.clone(),
            max_tokens: options
                .max_tokens
                .or(self.config.max_tokens)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            system: if system.is_empty() {
                None
            } else {
                Some(system.join("\n\n"))
            },
            messages: turns,
            temperature: options.temperature.or(self.config.temperature),
        }
    }
}

#[async_trait]
impl ProviderService for ClaudeService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let request = self.translate_request(messages, options);

        let mut builder = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json");
        for (name, value) in &self.config.custom_headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_http_error(status, &body, retry_after));
        }

        let parsed: ClaudeResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Failed to parse response: {e} - body: {body}")))?;

        let text: String = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
            })
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(ProviderError::parse("No text content in response"));
        }
        Ok(text)
    }

    fn provider_id(&self) -> ProviderId {
        self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

// Claude API types

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
}
