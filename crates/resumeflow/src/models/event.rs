use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Why a run stopped, using the vocabulary of the UI stream protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    ToolCalls,
    Error,
    Other,
}

impl FinishReason {
    /// Map an openai `finish_reason` value.
    pub fn from_openai(reason: &str) -> Self {
        match reason {
            "stop" => FinishReason::Stop,
            "length" => FinishReason::Length,
            "content_filter" => FinishReason::ContentFilter,
            "tool_calls" | "function_call" => FinishReason::ToolCalls,
            _ => FinishReason::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishReason::Stop => "stop",
            FinishReason::Length => "length",
            FinishReason::ContentFilter => "content-filter",
            FinishReason::ToolCalls => "tool-calls",
            FinishReason::Error => "error",
            FinishReason::Other => "other",
        }
    }
}

/// One increment of an agent run.
///
/// A run always starts with `RunStart` and ends with exactly one of
/// `RunFinish` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    RunStart,
    TextDelta {
        delta: String,
    },
    ToolCallStart {
        id: String,
        name: String,
    },
    ToolCallEnd {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        id: String,
        output: Value,
    },
    RunFinish {
        finish_reason: FinishReason,
    },
    Error {
        message: String,
    },
}

impl AgentEvent {
    pub fn text<S: Into<String>>(delta: S) -> Self {
        AgentEvent::TextDelta {
            delta: delta.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::RunFinish { .. } | AgentEvent::Error { .. })
    }
}
