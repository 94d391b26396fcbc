//! Retry decorator with exponential backoff
//!
//! Wraps any `ProviderService` and retries retryable failures (network,
//! 429, 5xx) with `base_delay * 2^(attempt-1)`, honoring a provider-supplied
//! retry-after when present. Non-retryable errors pass through untouched.

use super::{
    ChatMessage, ChatOptions, KeyValidation, ProviderError, ProviderId, ProviderService,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Retrying wrapper for provider services
pub struct RetryService {
    inner: Arc<dyn ProviderService>,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryService {
    pub fn new(inner: Arc<dyn ProviderService>, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            inner,
            // At least one attempt happens regardless of configuration
            max_retries: max_retries.max(1),
            base_delay,
        }
    }

    fn backoff(&self, attempt: u32, error: &ProviderError) -> Duration {
        error
            .retry_after
            .unwrap_or_else(|| self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

#[async_trait]
impl ProviderService for RetryService {
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.inner.chat(messages, options).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.kind.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt, &e);
                    tracing::warn!(
                        provider = %self.inner.provider_id(),
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = %delay.as_millis(),
                        error = %e.message,
                        "retrying provider request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn provider_id(&self) -> ProviderId {
        self.inner.provider_id()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    async fn validate_key(&self) -> KeyValidation {
        // A validation probe reports transient failure rather than retrying
        self.inner.validate_key().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ProviderErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails with a configurable error a fixed number of times, then succeeds
    struct FlakyService {
        failures: u32,
        kind: ProviderErrorKind,
        attempts: AtomicU32,
    }

    impl FlakyService {
        fn new(failures: u32, kind: ProviderErrorKind) -> Self {
            Self {
                failures,
                kind,
                attempts: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProviderService for FlakyService {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _options: &ChatOptions,
        ) -> Result<String, ProviderError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures {
                Err(ProviderError::new(self.kind, "injected failure"))
            } else {
                Ok("payload".to_string())
            }
        }

        fn provider_id(&self) -> ProviderId {
            ProviderId::Mock
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn two_503s_then_success_takes_exactly_three_attempts() {
        let flaky = Arc::new(FlakyService::new(2, ProviderErrorKind::ServerError));
        let retry = RetryService::new(flaky.clone(), 3, Duration::ZERO);

        let reply = retry
            .chat(&[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap();

        assert_eq!(reply, "payload");
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_return_the_final_error() {
        let flaky = Arc::new(FlakyService::new(5, ProviderErrorKind::Network));
        let retry = RetryService::new(flaky.clone(), 3, Duration::ZERO);

        let err = retry
            .chat(&[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Network);
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let flaky = Arc::new(FlakyService::new(5, ProviderErrorKind::Auth));
        let retry = RetryService::new(flaky.clone(), 3, Duration::ZERO);

        let err = retry
            .chat(&[ChatMessage::user("hi")], &ChatOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ProviderErrorKind::Auth);
        assert_eq!(flaky.attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_doubles_per_attempt_and_honors_retry_after() {
        let inner = Arc::new(FlakyService::new(0, ProviderErrorKind::Network));
        let retry = RetryService::new(inner, 3, Duration::from_millis(1000));

        let plain = ProviderError::network("boom");
        assert_eq!(retry.backoff(1, &plain), Duration::from_millis(1000));
        assert_eq!(retry.backoff(2, &plain), Duration::from_millis(2000));
        assert_eq!(retry.backoff(3, &plain), Duration::from_millis(4000));

        let hinted = ProviderError::rate_limit("slow").with_retry_after(Duration::from_secs(9));
        assert_eq!(retry.backoff(1, &hinted), Duration::from_secs(9));
    }
}
