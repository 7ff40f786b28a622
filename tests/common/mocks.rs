//! Mock implementations for testing.
//!
//! A scripted generation backend and a transport that records replies, shared
//! by the integration tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use relay::channel::Channel;
use relay::llm::LLMClient;
use relay::types::{AppError, InboundMessage, Message, Result};
use std::time::Duration;

/// One recorded `generate` call.
#[derive(Debug, Clone)]
pub struct GenerateCall {
    pub context: Vec<Message>,
    pub turn: String,
}

/// Mock LLM client with a fixed response (or failure) that records its calls.
///
/// # Examples
///
/// ```ignore
/// let client = MockLLMClient::new("привет, братишка");
/// let client = MockLLMClient::failing();
/// ```
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    delay: Option<Duration>,
    calls: Mutex<Vec<GenerateCall>>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Sleep before answering, to widen race windows in concurrency tests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<GenerateCall> {
        self.calls.lock().clone()
    }

    pub fn last_call(&self) -> Option<GenerateCall> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, context: &[Message], turn: &str) -> Result<String> {
        self.calls.lock().push(GenerateCall {
            context: context.to_vec(),
            turn: turn.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.should_fail {
            return Err(AppError::Backend("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Transport that keeps every reply instead of sending it.
#[derive(Default)]
pub struct RecordingChannel {
    replies: Mutex<Vec<(InboundMessage, String)>>,
    should_fail: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails (after recording the attempt).
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn replies(&self) -> Vec<String> {
        self.replies.lock().iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn reply_count(&self) -> usize {
        self.replies.lock().len()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    async fn reply(&self, to: &InboundMessage, text: &str) -> Result<()> {
        self.replies.lock().push((to.clone(), text.to_string()));
        if self.should_fail {
            return Err(AppError::Transport("Mock transport failure".to_string()));
        }
        Ok(())
    }
}
