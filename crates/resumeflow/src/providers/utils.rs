use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};

use super::base::{ProviderEvent, Usage};
use crate::errors::ProviderError;
use crate::models::event::FinishReason;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Convert internal Message format to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|message| {
            json!({
                "role": message.role.as_openai(),
                "content": message.content,
            })
        })
        .collect()
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>, ProviderError> {
    let mut tool_names = HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(ProviderError::Config(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Pull a readable message out of an OpenAI error body, falling back to the raw text.
pub fn openai_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value["error"]["message"]
                .as_str()
                .map(|message| message.to_string())
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

/// Turns `chat.completion.chunk` payloads into provider events.
///
/// Tool call arguments arrive in fragments keyed by index; they are
/// accumulated and released as a single `ToolCallEnd` once the choice
/// reports a finish reason.
#[derive(Debug, Default)]
pub struct OpenAiDeltaDecoder {
    tool_calls: BTreeMap<u64, PendingToolCall>,
    finish_reason: Option<FinishReason>,
    usage: Option<Usage>,
    done: bool,
}

impl OpenAiDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Decode one `data:` payload.
    pub fn on_data(&mut self, data: &str) -> Result<Vec<ProviderEvent>, ProviderError> {
        if self.done {
            return Ok(Vec::new());
        }
        if data == "[DONE]" {
            return Ok(self.finish());
        }

        let chunk: Value = serde_json::from_str(data)
            .map_err(|e| ProviderError::Decode(format!("{}: {}", e, data)))?;

        if let Some(error) = chunk.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown error");
            return Err(ProviderError::Api {
                status: 500,
                message: format!("Provider reported an error mid-stream: {}", message),
            });
        }

        if let Some(usage) = chunk.get("usage").filter(|u| !u.is_null()) {
            self.usage = Some(parse_usage(usage));
        }

        let mut events = Vec::new();
        let Some(choice) = chunk["choices"].get(0) else {
            return Ok(events);
        };

        let delta = &choice["delta"];
        if let Some(text) = delta["content"].as_str() {
            if !text.is_empty() {
                events.push(ProviderEvent::TextDelta(text.to_string()));
            }
        }

        if let Some(tool_calls) = delta["tool_calls"].as_array() {
            for tool_call in tool_calls {
                let index = tool_call["index"].as_u64().unwrap_or(0);
                let pending = self.tool_calls.entry(index).or_default();
                let was_started = !pending.id.is_empty() && !pending.name.is_empty();

                if let Some(id) = tool_call["id"].as_str() {
                    pending.id = id.to_string();
                }
                if let Some(name) = tool_call["function"]["name"].as_str() {
                    pending.name.push_str(name);
                }
                if let Some(arguments) = tool_call["function"]["arguments"].as_str() {
                    pending.arguments.push_str(arguments);
                }

                if !was_started && !pending.id.is_empty() && !pending.name.is_empty() {
                    events.push(ProviderEvent::ToolCallStart {
                        id: pending.id.clone(),
                        name: pending.name.clone(),
                    });
                }
            }
        }

        if let Some(reason) = choice["finish_reason"].as_str() {
            self.finish_reason = Some(FinishReason::from_openai(reason));
            events.extend(self.drain_tool_calls());
        }

        Ok(events)
    }

    /// Close the stream, releasing anything still pending and the final `Finish`.
    ///
    /// Returns nothing if the provider never reported a finish reason.
    pub fn finish(&mut self) -> Vec<ProviderEvent> {
        if self.done {
            return Vec::new();
        }
        self.done = true;

        let mut events = self.drain_tool_calls();
        if let Some(reason) = self.finish_reason.take() {
            events.push(ProviderEvent::Finish {
                reason,
                usage: self.usage.take(),
            });
        }
        events
    }

    fn drain_tool_calls(&mut self) -> Vec<ProviderEvent> {
        std::mem::take(&mut self.tool_calls)
            .into_values()
            .filter(|pending| !pending.id.is_empty())
            .map(|pending| {
                let input = if pending.arguments.trim().is_empty() {
                    json!({})
                } else {
                    match serde_json::from_str(&pending.arguments) {
                        Ok(value) => value,
                        Err(_) => Value::String(pending.arguments),
                    }
                };
                ProviderEvent::ToolCallEnd {
                    id: pending.id,
                    name: pending.name,
                    input,
                }
            })
            .collect()
    }
}

fn parse_usage(usage: &Value) -> Usage {
    let input_tokens = usage["prompt_tokens"].as_i64().map(|v| v as i32);
    let output_tokens = usage["completion_tokens"].as_i64().map(|v| v as i32);
    let total_tokens = usage["total_tokens"]
        .as_i64()
        .map(|v| v as i32)
        .or_else(|| match (input_tokens, output_tokens) {
            (Some(input), Some(output)) => Some(input + output),
            _ => None,
        });

    Usage::new(input_tokens, output_tokens, total_tokens)
}
