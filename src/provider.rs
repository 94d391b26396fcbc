//! LLM provider abstraction
//!
//! Provides a common interface over heterogeneous LLM HTTP APIs, plus the
//! retry/logging decorators and the adapter factory that instantiates and
//! caches the per-provider variants.

mod claude;
mod custom;
mod error;
mod factory;
mod gemini;
mod mock;
mod openai;
mod retry;
mod types;

pub use error::{ProviderError, ProviderErrorKind};
pub use factory::{supported_providers, AdapterFactory};
pub use retry::RetryService;
pub use types::*;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Per-request timeout for outbound provider calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
/// Connect timeout for outbound provider calls
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Common interface for LLM provider adapters
#[async_trait]
pub trait ProviderService: Send + Sync {
    /// Send a message list and return the assistant reply text
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError>;

    /// Which provider this adapter talks to
    fn provider_id(&self) -> ProviderId;

    /// The model this adapter is configured for
    fn model_id(&self) -> &str;

    /// Probe the configured credentials with a single short completion.
    /// Expected failures (bad key, unreachable host) are reported in-band.
    async fn validate_key(&self) -> KeyValidation {
        let probe = [ChatMessage::user("Reply with the single word: ok")];
        let options = ChatOptions {
            max_tokens: Some(16),
            temperature: Some(0.0),
        };
        match self.chat(&probe, &options).await {
            Ok(_) => KeyValidation::Valid,
            Err(e) => match e.kind {
                ProviderErrorKind::Network => KeyValidation::Unreachable { reason: e.message },
                _ => KeyValidation::Invalid { reason: e.message },
            },
        }
    }
}

/// Logging wrapper for provider services
pub struct LoggingService {
    inner: Arc<dyn ProviderService>,
    provider: ProviderId,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ProviderService>) -> Self {
        let provider = inner.provider_id();
        let model_id = inner.model_id().to_string();
        Self {
            inner,
            provider,
            model_id,
        }
    }
}

#[async_trait]
impl ProviderService for LoggingService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let start = std::time::Instant::now();
        let result = self.inner.chat(messages, options).await;
        let duration = start.elapsed();

        match &result {
            Ok(text) => {
                tracing::info!(
                    provider = %self.provider,
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    reply_chars = text.chars().count(),
                    "provider request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    provider = %self.provider,
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    retryable = e.kind.is_retryable(),
                    "provider request failed"
                );
            }
        }

        result
    }

    fn provider_id(&self) -> ProviderId {
        self.provider
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn validate_key(&self) -> KeyValidation {
        self.inner.validate_key().await
    }
}

/// Build the outbound HTTP client for an adapter. TLS verification is on
/// unless the config explicitly opts out.
pub(crate) fn build_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    let mut builder = Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT);

    if config.danger_accept_invalid_certs {
        tracing::warn!(
            provider = %config.provider,
            "TLS certificate verification disabled for outbound provider calls"
        );
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| ProviderError::unknown(format!("Failed to build HTTP client: {e}")))
}

/// Translate a reqwest transport error into a classified provider error
pub(crate) fn classify_send_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::network(format!("Request timeout: {e}"))
    } else if e.is_connect() {
        ProviderError::network(format!("Connection failed: {e}"))
    } else if e.is_request() {
        ProviderError::network(format!("Request failed: {e}"))
    } else {
        ProviderError::unknown(format!("Request failed: {e}"))
    }
}

/// Classify a non-2xx upstream response by status code
pub(crate) fn classify_http_error(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::auth(format!("Authentication failed: {body}")),
        402 => ProviderError::quota(format!("Quota exceeded: {body}")),
        429 => {
            let mut err = ProviderError::rate_limit(format!("Rate limited: {body}"));
            if let Some(delay) = retry_after {
                err = err.with_retry_after(delay);
            }
            err
        }
        400..=499 => ProviderError::invalid_request(format!("Invalid request: {body}")),
        500..=599 => ProviderError::server_error(format!("Server error ({status}): {body}")),
        _ => ProviderError::unknown(format!("HTTP {status}: {body}")),
    }
}

/// Parse a Retry-After header expressed in whole seconds
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            classify_http_error(StatusCode::UNAUTHORIZED, "bad key", None).kind,
            ProviderErrorKind::Auth
        );
        assert_eq!(
            classify_http_error(StatusCode::PAYMENT_REQUIRED, "", None).kind,
            ProviderErrorKind::QuotaExceeded
        );
        assert_eq!(
            classify_http_error(StatusCode::TOO_MANY_REQUESTS, "", None).kind,
            ProviderErrorKind::RateLimit
        );
        assert_eq!(
            classify_http_error(StatusCode::SERVICE_UNAVAILABLE, "", None).kind,
            ProviderErrorKind::ServerError
        );
        assert_eq!(
            classify_http_error(StatusCode::BAD_REQUEST, "", None).kind,
            ProviderErrorKind::InvalidRequest
        );
    }

    #[test]
    fn rate_limit_carries_retry_after() {
        let err = classify_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            "",
            Some(Duration::from_secs(30)),
        );
        assert_eq!(err.retry_after, Some(Duration::from_secs(30)));
    }

    #[test]
    fn retry_after_header_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "12".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(12)));

        let mut bad = HeaderMap::new();
        bad.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&bad), None);
    }
}
