/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, the client that turns one
 * composite batch text or one line into a chat-completion request, and retries
 * it according to the batch or single-line `RetryPolicy`.
 */

use anyhow::Result;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::app_config::{ApiConfig, Config, RetryConfig};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils;
use crate::providers::openai::OpenAI;
use crate::providers::{OpenAIRequest, Provider};

use super::prompts::PromptTemplate;
use super::retry::{shrink_text, sleep_or_cancel, RetryPolicy};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Number of requests that reached the endpoint and succeeded
    pub successful_requests: u64,

    /// Number of failed attempts, retries included
    pub failed_attempts: u64,

    /// Total time spent on successful requests
    pub api_duration: Duration,
}

impl TokenUsageStats {
    /// Total tokens consumed
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }

    /// One-line summary for the log
    pub fn summary(&self) -> String {
        format!(
            "{} request(s), {} failed attempt(s), {} tokens ({} prompt + {} completion), {:.1}s in API calls",
            self.successful_requests,
            self.failed_attempts,
            self.total_tokens(),
            self.prompt_tokens,
            self.completion_tokens,
            self.api_duration.as_secs_f64()
        )
    }
}

/// Which request path a call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Composite batch text with separators
    Batch,
    /// One line
    SingleLine,
}

/// Translation client shared by every batch and fallback of a job
#[derive(Clone)]
pub struct TranslationService {
    /// Provider implementation
    provider: Arc<dyn Provider>,

    /// Endpoint settings: model, temperatures and token budgets
    api: ApiConfig,

    /// Retry policies
    retry: RetryConfig,

    /// Accumulated usage
    usage: Arc<Mutex<TokenUsageStats>>,
}

impl TranslationService {
    /// Create a service on top of an existing provider
    pub fn new(provider: Arc<dyn Provider>, api: ApiConfig, retry: RetryConfig) -> Self {
        Self {
            provider,
            api,
            retry,
            usage: Arc::new(Mutex::new(TokenUsageStats::default())),
        }
    }

    /// Create a service talking to the OpenAI-compatible endpoint of `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider = OpenAI::new(
            config.api.api_key.clone(),
            config.api.endpoint.clone(),
            config.api.timeout_secs,
        );
        Ok(Self::new(Arc::new(provider), config.api.clone(), config.retry.clone()))
    }

    /// Snapshot of accumulated usage
    pub fn usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }

    /// Translate a composite batch text with the batch retry policy
    pub async fn translate_batch_text(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        self.request_with_retry(RequestKind::Batch, text, source_language, target_language, cancel)
            .await
    }

    /// Translate one line with the single-line retry policy
    pub async fn translate_single_line(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        self.request_with_retry(RequestKind::SingleLine, text, source_language, target_language, cancel)
            .await
    }

    /// Send one tiny request without retry and return the model's reply
    pub async fn test_connection(&self, cancel: &CancellationToken) -> Result<String, TranslationError> {
        debug!("Testing connection to {} with model {}", self.provider.name(), self.api.model);
        let request = OpenAIRequest::new(self.api.model.clone())
            .add_message("user", "Hello")
            .temperature(0.1)
            .max_tokens(10);

        let response = self.provider.complete(request, cancel).await?;
        Ok(response.first_content()?)
    }

    /// Retry policy of a request path
    pub fn policy(&self, kind: RequestKind) -> RetryPolicy {
        match kind {
            RequestKind::Batch => self.retry.batch,
            RequestKind::SingleLine => self.retry.single_line,
        }
    }

    fn build_request(&self, kind: RequestKind, text: &str, source_language: &str, target_language: &str) -> OpenAIRequest {
        let (template, temperature, max_tokens) = match kind {
            RequestKind::Batch => (PromptTemplate::batch(), self.api.batch_temperature, self.api.batch_max_tokens),
            RequestKind::SingleLine => (
                PromptTemplate::single_line(),
                self.api.single_line_temperature,
                self.api.single_line_max_tokens,
            ),
        };
        let system_prompt = template.render(
            &language_utils::display_name(source_language),
            &language_utils::display_name(target_language),
        );

        OpenAIRequest::new(self.api.model.clone())
            .add_message("system", system_prompt)
            .add_message("user", text)
            .temperature(temperature)
            .max_tokens(max_tokens)
    }

    async fn request_with_retry(
        &self,
        kind: RequestKind,
        text: &str,
        source_language: &str,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<String, TranslationError> {
        let policy = self.policy(kind);
        let mut text = text.to_string();
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..policy.max_attempts {
            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            let request = self.build_request(kind, &text, source_language, target_language);
            let started = Instant::now();
            let result = match self.provider.complete(request, cancel).await {
                Ok(response) => {
                    let content = response.first_content();
                    if content.is_ok() {
                        let mut usage = self.usage.lock();
                        usage.successful_requests += 1;
                        usage.api_duration += started.elapsed();
                        if let Some(tokens) = &response.usage {
                            usage.prompt_tokens += u64::from(tokens.prompt_tokens);
                            usage.completion_tokens += u64::from(tokens.completion_tokens);
                        }
                    }
                    content
                }
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(content) => return Ok(content),
                Err(ProviderError::Cancelled) => return Err(TranslationError::Cancelled),
                Err(e) => e,
            };
            self.usage.lock().failed_attempts += 1;

            let is_last = attempt + 1 >= policy.max_attempts;
            let wait = match &error {
                ProviderError::RateLimitExceeded(_) => Some(policy.rate_limit_delay(attempt)),
                ProviderError::TokenLimitExceeded(_) if policy.shrink_on_token_limit => {
                    let shrunk = shrink_text(&text);
                    if shrunk.len() < text.len() {
                        debug!(
                            "Token limit hit, shortening input from {} to {} chars",
                            text.chars().count(),
                            shrunk.chars().count()
                        );
                    }
                    text = shrunk;
                    None
                }
                _ => Some(policy.error_delay(attempt)),
            };

            warn!(
                "{:?} request attempt {}/{} failed: {}",
                kind,
                attempt + 1,
                policy.max_attempts,
                error
            );
            last_error = Some(error);

            if is_last {
                break;
            }
            if let Some(wait) = wait {
                debug!("Retrying in {}ms", wait.as_millis());
                if !sleep_or_cancel(wait, cancel).await {
                    return Err(TranslationError::Cancelled);
                }
            }
        }

        let message = last_error
            .map(|e| TranslationError::from(e).to_string())
            .unwrap_or_else(|| "no attempt was made".to_string());
        Err(TranslationError::TranslationFailed {
            attempts: policy.max_attempts,
            message,
        })
    }
}
