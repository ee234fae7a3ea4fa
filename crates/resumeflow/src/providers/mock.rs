use async_trait::async_trait;
use futures::StreamExt;
use std::sync::{Arc, Mutex};

use super::base::{Provider, ProviderEvent, ProviderStream};
use crate::errors::ProviderError;
use crate::models::event::FinishReason;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A provider that replays a scripted stream, used in tests
pub struct MockProvider {
    script: Vec<Result<ProviderEvent, ProviderError>>,
    rejection: Option<ProviderError>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a mock that streams the given items on every call
    pub fn new(script: Vec<Result<ProviderEvent, ProviderError>>) -> Self {
        Self {
            script,
            rejection: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Stream each chunk as a text delta, then stop
    pub fn with_text(chunks: &[&str]) -> Self {
        let mut script: Vec<_> = chunks
            .iter()
            .map(|chunk| Ok(ProviderEvent::TextDelta(chunk.to_string())))
            .collect();
        script.push(Ok(ProviderEvent::Finish {
            reason: FinishReason::Stop,
            usage: None,
        }));
        Self::new(script)
    }

    /// Reject every request before any output is produced
    pub fn rejecting(error: ProviderError) -> Self {
        Self {
            rejection: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Message histories received so far, one entry per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn model(&self) -> &str {
        "mock"
    }

    async fn stream(
        &self,
        _system: &str,
        messages: &[Message],
        _tools: &[Tool],
    ) -> Result<ProviderStream, ProviderError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        if let Some(error) = &self.rejection {
            return Err(error.clone());
        }
        Ok(futures::stream::iter(self.script.clone()).boxed())
    }
}
