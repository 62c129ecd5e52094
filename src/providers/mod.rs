/*!
 * Provider implementations for chat-completion endpoints.
 *
 * This module contains the client used to reach the translation model:
 * - OpenAI: any OpenAI-compatible `/chat/completions` endpoint (DeepSeek, OpenAI, local servers)
 * - Mock: a scripted in-process provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;

pub use self::openai::{OpenAIRequest, OpenAIResponse};

/// Common trait for chat-completion providers
///
/// Implementations must race the request against `cancel` and return
/// `ProviderError::Cancelled` promptly once it fires, instead of waiting out
/// their transport timeout.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    /// * `cancel` - Job cancellation token
    ///
    /// # Returns
    /// * `Result<OpenAIResponse, ProviderError>` - The response from the provider or an error
    async fn complete(
        &self,
        request: OpenAIRequest,
        cancel: &CancellationToken,
    ) -> Result<OpenAIResponse, ProviderError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

pub mod mock;
pub mod openai;
