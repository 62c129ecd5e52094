/*!
 * Error types for the linewise application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when talking to a chat-completion endpoint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Error when parsing an API response fails, or the response lacks the expected shape
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// HTTP 429 or a rate-limit flavored error body
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// HTTP 400 complaining about the token budget of the request
    #[error("Token limit exceeded: {0}")]
    TokenLimitExceeded(String),

    /// The request was aborted through the job cancellation token
    #[error("Request cancelled")]
    Cancelled,
}

impl ProviderError {
    /// Build an error from a non-2xx response, classifying rate and token limits
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        if status_code == 429 || lowered.contains("rate limit") {
            Self::RateLimitExceeded(message)
        } else if status_code == 400 && lowered.contains("token") {
            Self::TokenLimitExceeded(message)
        } else {
            Self::ApiError { status_code, message }
        }
    }

    /// Human readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            Self::ParseError(m)
            | Self::ConnectionError(m)
            | Self::RateLimitExceeded(m)
            | Self::TokenLimitExceeded(m) => m.clone(),
            Self::ApiError { message, .. } => message.clone(),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

/// Errors that can occur during a file translation job
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslationError {
    /// The input has no translatable content
    #[error("No translatable content: {0}")]
    EmptyInput(String),

    /// The job was cancelled cooperatively
    #[error("Translation cancelled")]
    Cancelled,

    /// The endpoint is rate limiting us
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The endpoint answered with an unexpected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Transport level failure or unexpected HTTP status
    #[error("Network error: {0}")]
    Network(String),

    /// A unit of work failed after all retries
    #[error("Translation failed after {attempts} attempts: {message}")]
    TranslationFailed {
        /// Attempts made before giving up
        attempts: u32,
        /// Last underlying error message
        message: String,
    },

    /// Result accounting does not add up; this is a pipeline defect
    #[error("Progress invariant violated: expected {expected} lines, accounted for {actual}")]
    ProgressInvariant {
        /// Lines in the input
        expected: usize,
        /// Lines accounted for in the output buffer
        actual: usize,
    },

    /// The input file could not be read
    #[error("Failed to read file: {0}")]
    FileRead(String),

    /// The report could not be exported
    #[error("Failed to export report: {0}")]
    Export(String),

    /// The configuration is unusable for a job
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl TranslationError {
    /// Whether this error ends the job as a failure rather than being contained
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::EmptyInput(_)
                | Self::ProgressInvariant { .. }
                | Self::FileRead(_)
                | Self::Export(_)
                | Self::Config(_)
        )
    }
}

impl From<ProviderError> for TranslationError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Cancelled => Self::Cancelled,
            ProviderError::RateLimitExceeded(m) => Self::RateLimited(m),
            ProviderError::ParseError(m) => Self::MalformedResponse(m),
            ProviderError::ConnectionError(m) | ProviderError::TokenLimitExceeded(m) => Self::Network(m),
            ProviderError::ApiError { status_code, message } => {
                Self::Network(format!("HTTP {}: {}", status_code, message))
            }
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
