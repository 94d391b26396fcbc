//! Fully generic adapter for arbitrary `OpenAI`/Claude-compatible endpoints
//!
//! The request and response wire shapes are chosen independently via
//! `ProviderConfig::request_format` / `response_format`. The `custom`
//! response format probes a list of common reply locations instead of
//! assuming one schema.

use super::{
    build_client, classify_http_error, classify_send_error, parse_retry_after, ChatMessage,
    ChatOptions, MessageRole, ProviderConfig, ProviderError, ProviderId, ProviderService,
    WireFormat,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

/// Generic custom-endpoint service
pub struct CustomService {
    client: Client,
    config: ProviderConfig,
    request_format: WireFormat,
    response_format: WireFormat,
}

impl CustomService {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(&config)?;
        let request_format = config.request_format.unwrap_or(WireFormat::OpenAi);
        let response_format = config.response_format.unwrap_or(WireFormat::OpenAi);
        Ok(Self {
            client,
            config,
            request_format,
            response_format,
        })
    }

    fn build_body(&self, messages: &[ChatMessage], options: &ChatOptions) -> Value {
        let max_tokens = options.max_tokens.or(self.config.max_tokens);
        let temperature = options.temperature.or(self.config.temperature);

        match self.request_format {
            WireFormat::Claude => {
                let system: Vec<&str> = messages
                    .iter()
                    .filter(|m| m.role == MessageRole::System)
                    .map(|m| m.content.as_str())
                    .collect();
                let turns: Vec<Value> = messages
                    .iter()
                    .filter(|m| m.role != MessageRole::System)
                    .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                    .collect();
                let mut body = json!({
                    "model": self.config.model,
                    "max_tokens": max_tokens.unwrap_or(4096),
                    "messages": turns,
                });
                if !system.is_empty() {
                    body["system"] = Value::String(system.join("\n\n"));
                }
                if let Some(t) = temperature {
                    body["temperature"] = json!(t);
                }
                body
            }
            // OpenAI shape doubles as the opaque default: most bring-your-own
            // endpoints in the wild speak it.
            WireFormat::OpenAi | WireFormat::Custom => {
                let turns: Vec<Value> = messages
                    .iter()
                    .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                    .collect();
                let mut body = json!({
                    "model": self.config.model,
                    "messages": turns,
                    "stream": false,
                });
                if let Some(mt) = max_tokens {
                    body["max_tokens"] = json!(mt);
                }
                if let Some(t) = temperature {
                    body["temperature"] = json!(t);
                }
                body
            }
        }
    }

    fn parse_reply(&self, body: &Value) -> Result<String, ProviderError> {
        let text = match self.response_format {
            WireFormat::OpenAi => body
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str),
            WireFormat::Claude => body.pointer("/content/0/text").and_then(Value::as_str),
            WireFormat::Custom => probe_reply(body),
        };

        match text {
            Some(t) if !t.is_empty() => Ok(t.to_string()),
            _ => Err(ProviderError::parse(format!(
                "Could not locate reply text in response: {body}"
            ))),
        }
    }
}

/// Probe common reply locations, in order
fn probe_reply(body: &Value) -> Option<&str> {
    const POINTERS: &[&str] = &[
        "/choices/0/message/content",
        "/content/0/text",
        "/response",
        "/text",
        "/output",
        "/message/content",
    ];
    POINTERS
        .iter()
        .find_map(|p| body.pointer(p).and_then(Value::as_str))
}

#[async_trait]
impl ProviderService for CustomService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let body = self.build_body(messages, options);

        let mut builder = self
            .client
            .post(&self.config.api_url)
            .header("content-type", "application/json");
        builder = match self.request_format {
            WireFormat::Claude => builder
                .header("x-api-key", &self.config.api_key)
                .header("anthropic-version", "2023-06-01"),
            _ => builder.bearer_auth(&self.config.api_key),
        };
        for (name, value) in &self.config.custom_headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_http_error(status, &text, retry_after));
        }

        let parsed: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::parse(format!("Response is not JSON: {e}")))?;
        self.parse_reply(&parsed)
    }

    fn provider_id(&self) -> ProviderId {
        self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}
