use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;

use crate::errors::AgentResult;
use crate::models::event::{AgentEvent, FinishReason};
use crate::models::message::Message;
use crate::models::tool::Tool;
use crate::prompt::RESUMEFLOW_SYSTEM_PROMPT;
use crate::providers::base::{Provider, ProviderEvent};

/// The fixed inputs an agent is assembled from
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub system_prompt: String,
    pub tools: Vec<Tool>,
}

impl AgentConfig {
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            tools: Vec::new(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(RESUMEFLOW_SYSTEM_PROMPT)
    }
}

/// Agent integrates a foundational LLM with its instruction and tools
pub struct Agent {
    provider: Arc<dyn Provider>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(provider: Arc<dyn Provider>, config: AgentConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Run the agent over a conversation and stream what it produces.
    ///
    /// The provider request is made before this returns, so a rejected
    /// request is an `Err` here. The stream starts with `RunStart` and ends
    /// with exactly one `RunFinish` or `Error`.
    pub async fn reply(&self, messages: &[Message]) -> AgentResult<BoxStream<'static, AgentEvent>> {
        tracing::debug!(
            model = self.provider.model(),
            messages = messages.len(),
            tools = self.config.tools.len(),
            "starting agent reply"
        );

        let mut provider_stream = self
            .provider
            .stream(&self.config.system_prompt, messages, &self.config.tools)
            .await?;

        Ok(Box::pin(async_stream::stream! {
            yield AgentEvent::RunStart;

            while let Some(item) = provider_stream.next().await {
                match item {
                    Ok(ProviderEvent::TextDelta(delta)) => {
                        yield AgentEvent::TextDelta { delta };
                    }
                    Ok(ProviderEvent::ToolCallStart { id, name }) => {
                        yield AgentEvent::ToolCallStart { id, name };
                    }
                    Ok(ProviderEvent::ToolCallEnd { id, name, input }) => {
                        yield AgentEvent::ToolCallEnd { id, name, input };
                    }
                    Ok(ProviderEvent::Finish { reason, usage }) => {
                        if let Some(usage) = usage {
                            tracing::debug!(?usage, "agent reply finished");
                        }
                        yield AgentEvent::RunFinish { finish_reason: reason };
                        return;
                    }
                    Err(e) => {
                        tracing::error!("Error while streaming agent reply: {}", e);
                        yield AgentEvent::Error { message: e.to_string() };
                        return;
                    }
                }
            }

            // provider closed the stream without a finish reason, so the reply was cut off
            tracing::warn!("Provider stream ended without a finish reason");
            yield AgentEvent::RunFinish { finish_reason: FinishReason::Other };
        }))
    }
}
