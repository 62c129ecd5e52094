/*!
 * Scripted in-process provider.
 *
 * Every call is recorded and answered by a responder closure, which sees the
 * user text and the zero-based call index. In-flight and peak-in-flight counts
 * are tracked so tests can observe the concurrency limit.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::ProviderError;
use crate::translation::batch::SEPARATOR;
use super::{OpenAIRequest, OpenAIResponse, Provider};

/// A request as seen by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct MockCall {
    /// Zero-based arrival order
    pub index: usize,
    /// System prompt of the request
    pub system_prompt: String,
    /// User message of the request
    pub user_text: String,
    /// Temperature of the request
    pub temperature: f32,
    /// Token budget of the request
    pub max_tokens: u32,
}

impl MockCall {
    /// Whether the user text carries more than one separated segment
    pub fn is_composite(&self) -> bool {
        self.user_text.contains(SEPARATOR)
    }
}

/// What the mock answers with
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful completion with this content
    Text(String),
    /// A well-formed HTTP success whose body has no choices
    Malformed,
    /// Provider failure
    Error(ProviderError),
}

/// Responder closure type
pub type Responder = Arc<dyn Fn(&MockCall) -> MockReply + Send + Sync>;

/// Latency closure type
pub type LatencyFn = Arc<dyn Fn(&MockCall) -> Duration + Send + Sync>;

/// Scripted provider for tests and benchmarks
pub struct MockProvider {
    responder: Responder,
    latency: LatencyFn,
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("calls", &self.call_count())
            .field("peak_in_flight", &self.peak_in_flight())
            .finish()
    }
}

/// Deterministic fake translation of one segment
pub fn fake_translate(segment: &str) -> String {
    format!("<{}>", segment.trim())
}

/// Fake translation of a composite text, segment by segment
pub fn fake_translate_composite(text: &str) -> String {
    text.split(SEPARATOR)
        .map(fake_translate)
        .collect::<Vec<_>>()
        .join(SEPARATOR)
}

impl MockProvider {
    /// Create a provider answering with `responder` and no latency
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&MockCall) -> MockReply + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            latency: Arc::new(|_| Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Provider that translates every segment with `fake_translate`
    pub fn translating() -> Self {
        Self::new(|call| MockReply::Text(fake_translate_composite(&call.user_text)))
    }

    /// Provider that fails every call with the given error
    pub fn failing(error: ProviderError) -> Self {
        Self::new(move |_| MockReply::Error(error.clone()))
    }

    /// Set a fixed latency for every call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Arc::new(move |_| latency);
        self
    }

    /// Set a per-call latency
    pub fn with_latency_fn<F>(mut self, latency: F) -> Self
    where
        F: Fn(&MockCall) -> Duration + Send + Sync + 'static,
    {
        self.latency = Arc::new(latency);
        self
    }

    /// Number of calls received so far
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Snapshot of every call received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    /// Highest number of simultaneously running calls
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record(&self, request: &OpenAIRequest) -> MockCall {
        let mut calls = self.calls.lock();
        let call = MockCall {
            index: calls.len(),
            system_prompt: request.content_of("system").unwrap_or_default().to_string(),
            user_text: request.content_of("user").unwrap_or_default().to_string(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        calls.push(call.clone());
        call
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        request: OpenAIRequest,
        cancel: &CancellationToken,
    ) -> Result<OpenAIResponse, ProviderError> {
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        let call = self.record(&request);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let latency = (self.latency)(&call);
        let cancelled = if latency.is_zero() {
            false
        } else {
            tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(latency) => false,
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if cancelled {
            return Err(ProviderError::Cancelled);
        }

        match (self.responder)(&call) {
            MockReply::Text(text) => Ok(OpenAIResponse::with_content(text)),
            MockReply::Malformed => Ok(OpenAIResponse::default()),
            MockReply::Error(error) => Err(error),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
