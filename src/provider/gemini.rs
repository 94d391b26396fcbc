//! Google Gemini provider implementation

use super::{
    build_client, classify_http_error, classify_send_error, parse_retry_after, ChatMessage,
    ChatOptions, MessageRole, ProviderConfig, ProviderError, ProviderId, ProviderService,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    config: ProviderConfig,
    /// Full generateContent endpoint, without the key query parameter
    endpoint: String,
}

impl GeminiService {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = build_client(&config)?;
        // The catalog default is the models base; a caller-supplied URL is
        // taken verbatim when it already names an action.
        let endpoint = if config.api_url.contains(":generateContent") {
            config.api_url.clone()
        } else {
            format!(
                "{}/{}:generateContent",
                config.api_url.trim_end_matches('/'),
                config.model
            )
        };
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    fn translate_request(&self, messages: &[ChatMessage], options: &ChatOptions) -> GeminiRequest {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = if system.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart {
                    text: system.join("\n\n"),
                }],
            })
        };

        let contents = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        GeminiRequest {
            contents,
            system_instruction,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: options.max_tokens.or(self.config.max_tokens),
                temperature: options.temperature.or(self.config.temperature),
            }),
        }
    }
}

#[async_trait]
impl ProviderService for GeminiService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let request = self.translate_request(messages, options);
        let url = format!("{}?key={}", self.endpoint, self.config.api_key);

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
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
            if let Ok(parsed) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                return Err(classify_http_error(status, &parsed.error.message, retry_after));
            }
            return Err(classify_http_error(status, &body, retry_after));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::parse(format!("Failed to parse response: {e} - body: {body}")))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::parse("No candidates in response"))?;

        let text: String = candidate
            .content
            .parts
            .into_iter()
            .map(|p| p.text)
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

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
