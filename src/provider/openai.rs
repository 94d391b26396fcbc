//! `OpenAI`-shape provider implementation
//!
//! Covers `OpenAI` itself plus the `OpenAI`-compatible providers (DeepSeek,
//! Moonshot) which differ only in default endpoint and model naming.

use super::{
    build_client, classify_http_error, classify_send_error, parse_retry_after, ChatMessage,
    ChatOptions, ProviderConfig, ProviderError, ProviderId, ProviderService,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// `OpenAI`-compatible service implementation
pub struct OpenAiService {
    client: Client,
    config: ProviderConfig,
}

impl OpenAiService {
    /// `config` must arrive with `api_url` and `model` already resolved
    /// (the factory fills in provider defaults).
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(&config)?;
        Ok(Self { client, config })
    }

    fn translate_request(&self, messages: &[ChatMessage], options: &ChatOptions) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: messages
                .iter()
                .map(|m| OpenAiMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: options.max_tokens.or(self.config.max_tokens),
            temperature: options.temperature.or(self.config.temperature),
            stream: false,
        }
    }
}

#[async_trait]
impl ProviderService for OpenAiService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let request = self.translate_request(messages, options);

        let mut builder = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
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

        let parsed: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Failed to parse response: {e} - body: {body}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::parse("No choices in response"))
    }

    fn provider_id(&self) -> ProviderId {
        self.config.provider
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MessageRole;

    fn service() -> OpenAiService {
        OpenAiService::new(ProviderConfig {
            provider: ProviderId::Deepseek,
            api_key: "sk-test".to_string(),
            api_url: "https://api.deepseek.com/v1/chat/completions".to_string(),
            model: "deepseek-chat".to_string(),
            max_tokens: Some(1024),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn request_translation_keeps_roles_in_order() {
        let svc = service();
        let messages = [
            ChatMessage::system("you are a circuit assistant"),
            ChatMessage::user("设计一个LED电路"),
            ChatMessage::assistant("好的"),
        ];
        let request = svc.translate_request(&messages, &ChatOptions::default());
        assert_eq!(request.model, "deepseek-chat");
        let roles: Vec<&str> = request.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, ["system", "user", "assistant"]);
        // Config-level max_tokens applies when the call supplies none
        assert_eq!(request.max_tokens, Some(1024));
    }

    #[test]
    fn call_options_override_config() {
        let svc = service();
        let messages = [ChatMessage {
            role: MessageRole::User,
            content: "hi".to_string(),
        }];
        let options = ChatOptions {
            max_tokens: Some(16),
            temperature: Some(0.5),
        };
        let request = svc.translate_request(&messages, &options);
        assert_eq!(request.max_tokens, Some(16));
        assert_eq!(request.temperature, Some(0.5));
    }

    #[test]
    fn response_parsing_takes_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hello"}},{"message":{"role":"assistant","content":"ignored"}}]}"#;
        let parsed: OpenAiResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hello");
    }
}
