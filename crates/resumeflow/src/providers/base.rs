use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ProviderError;
use crate::models::event::FinishReason;
use crate::models::message::Message;
use crate::models::tool::Tool;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// An increment of a streamed completion, as reported by a provider
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    TextDelta(String),
    ToolCallStart {
        id: String,
        name: String,
    },
    ToolCallEnd {
        id: String,
        name: String,
        input: Value,
    },
    Finish {
        reason: FinishReason,
        usage: Option<Usage>,
    },
}

pub type ProviderStream = BoxStream<'static, Result<ProviderEvent, ProviderError>>;

/// Base trait for AI providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// The model identifier requests are sent to
    fn model(&self) -> &str;

    /// Start a streamed completion.
    ///
    /// Resolves once the provider has accepted the request, so a rejected
    /// request (bad key, rate limit) surfaces here rather than mid-stream.
    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<ProviderStream, ProviderError>;
}
