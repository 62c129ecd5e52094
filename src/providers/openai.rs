use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use super::Provider;

/// Client for OpenAI-compatible chat-completion APIs
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// Bearer credential
    api_key: String,
    /// Base URL, without the `/chat/completions` suffix
    endpoint: String,
}

/// Chat-completion request body
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OpenAIRequest {
    /// The model to use
    pub model: String,

    /// The messages for the conversation
    pub messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    pub temperature: f32,

    /// Maximum number of tokens to generate
    pub max_tokens: u32,
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    #[serde(default)]
    pub content: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenUsage {
    /// Number of prompt tokens
    pub prompt_tokens: u32,
    /// Number of completion tokens
    pub completion_tokens: u32,
    /// Total number of tokens
    pub total_tokens: u32,
}

/// A single completion choice
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OpenAIChoice {
    /// The generated message
    pub message: Option<OpenAIMessage>,
}

/// Chat-completion response body
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
pub struct OpenAIResponse {
    /// Completion choices; only the first is used
    #[serde(default)]
    pub choices: Vec<OpenAIChoice>,

    /// Token usage information
    #[serde(default)]
    pub usage: Option<TokenUsage>,
}

/// Error body returned by most OpenAI-compatible servers
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAIRequest {
    /// Create a new request
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: 0.7,
            max_tokens: 2000,
        }
    }

    /// Add a message to the request
    pub fn add_message(mut self, role: impl Into<String>, content: impl Into<String>) -> Self {
        self.messages.push(OpenAIMessage {
            role: role.into(),
            content: Some(content.into()),
        });
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Content of the first message with the given role
    pub fn content_of(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .and_then(|m| m.content.as_deref())
    }
}

impl OpenAIResponse {
    /// Build a response with a single assistant choice
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            choices: vec![OpenAIChoice {
                message: Some(OpenAIMessage {
                    role: "assistant".to_string(),
                    content: Some(content.into()),
                }),
            }],
            usage: None,
        }
    }

    /// Extract `choices[0].message.content`
    pub fn first_content(&self) -> Result<String, ProviderError> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.clone())
            .ok_or_else(|| ProviderError::ParseError("response has no choices[0].message.content".to_string()))
    }
}

impl OpenAI {
    /// Create a new client for the given endpoint
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Full URL of the chat-completion resource
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Pull an error message out of an error body, or fall back to the status line
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<ErrorEnvelope>(body)
            .map(|envelope| envelope.error.message)
            .unwrap_or_else(|_| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown status")
                )
            })
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(
        &self,
        request: OpenAIRequest,
        cancel: &CancellationToken,
    ) -> Result<OpenAIResponse, ProviderError> {
        let url = self.completions_url();

        let send = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            result = send => result.map_err(|e| ProviderError::ConnectionError(e.to_string()))?,
        };

        let status = response.status();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            result = response.text() => result.map_err(|e| ProviderError::ConnectionError(e.to_string()))?,
        };

        if !status.is_success() {
            let message = Self::error_message(status, &body);
            error!("Chat API error ({}): {}", status, message);
            return Err(ProviderError::from_status(status.as_u16(), message));
        }

        let parsed = serde_json::from_str::<OpenAIResponse>(&body)
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Token usage: {} prompt + {} completion = {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        Ok(parsed)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}
