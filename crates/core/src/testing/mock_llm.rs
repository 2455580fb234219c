//! Mock LLM client for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{sleep, Duration};

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// A recorded completion call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCompletion {
    pub system: Option<String>,
    pub prompt: String,
}

/// Mock implementation of the LlmClient trait.
///
/// Provides controllable behavior for testing:
/// - Script responses (queued, or one repeated)
/// - Inject errors
/// - Simulate latency (for single-flight tests)
/// - Record prompts for assertions
pub struct MockLlmClient {
    /// Queued responses; when empty, `default_response` is used.
    queued: Arc<RwLock<Vec<String>>>,
    /// Response used when the queue is empty (None = error).
    default_response: Arc<RwLock<Option<String>>>,
    /// If set, the next call fails with an HTTP error.
    next_error: Arc<RwLock<Option<String>>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCompletion>>>,
    /// Artificial delay per call.
    latency: Option<Duration>,
}

impl MockLlmClient {
    /// A client that answers every call with the same text.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            queued: Arc::new(RwLock::new(Vec::new())),
            default_response: Arc::new(RwLock::new(Some(response.into()))),
            next_error: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            latency: None,
        }
    }

    /// A client whose every call fails.
    pub fn always_failing() -> Self {
        Self {
            queued: Arc::new(RwLock::new(Vec::new())),
            default_response: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            latency: None,
        }
    }

    /// Add artificial latency to every call.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue responses to be returned in order before the default kicks in.
    pub async fn queue_responses(&self, responses: Vec<String>) {
        let mut queued = self.queued.write().await;
        *queued = responses;
        queued.reverse(); // pop() returns them in the original order
    }

    /// Make only the next call fail.
    pub async fn set_next_error(&self, message: impl Into<String>) {
        *self.next_error.write().await = Some(message.into());
    }

    /// Number of completion calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Recorded calls, oldest first.
    pub async fn recorded_calls(&self) -> Vec<RecordedCompletion> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.write().await.push(RecordedCompletion {
            system: request.system.clone(),
            prompt: request.prompt.clone(),
        });

        if let Some(latency) = self.latency {
            sleep(latency).await;
        }

        if let Some(message) = self.next_error.write().await.take() {
            return Err(LlmError::Http(message));
        }

        let text = {
            let mut queued = self.queued.write().await;
            match queued.pop() {
                Some(text) => Some(text),
                None => self.default_response.read().await.clone(),
            }
        };

        match text {
            Some(text) => Ok(CompletionResponse {
                text,
                usage: LlmUsage {
                    input_tokens: 100,
                    output_tokens: 50,
                },
                model: "mock-model".to_string(),
            }),
            None => Err(LlmError::Http("mock generator configured to fail".to_string())),
        }
    }
}
