//! Encoding of agent events into the AI SDK UI message stream.
//!
//! Every chunk is a JSON object tagged by `type`, written to the response as
//! a server-sent event (`data: {json}\n\n`). The stream is closed by a
//! literal `data: [DONE]` event.
//!
//! Text arrives in blocks: the first delta of a block is preceded by
//! `text-start`, and a tool call or the end of the run closes it with
//! `text-end`. Block ids are `txt_0`, `txt_1`, ...
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::event::{AgentEvent, FinishReason};

/// Header announcing the stream protocol to the `useChat` client
pub const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";
pub const UI_MESSAGE_STREAM_VERSION: &str = "v1";
/// Final server-sent event of every stream
pub const SSE_DONE: &str = "data: [DONE]\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiChunk {
    #[serde(rename = "start")]
    MessageStart {
        #[serde(rename = "messageId")]
        message_id: String,
    },
    StartStep,
    TextStart {
        id: String,
    },
    TextDelta {
        id: String,
        delta: String,
    },
    TextEnd {
        id: String,
    },
    ToolInputStart {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
    },
    ToolInputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        #[serde(rename = "toolName")]
        tool_name: String,
        input: Value,
    },
    ToolOutputAvailable {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        output: Value,
    },
    FinishStep,
    Finish {
        #[serde(rename = "finishReason", skip_serializing_if = "Option::is_none")]
        finish_reason: Option<FinishReason>,
    },
    Error {
        #[serde(rename = "errorText")]
        error_text: String,
    },
}

impl UiChunk {
    /// Frame the chunk as a server-sent event.
    pub fn to_sse(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => format!("data: {}\n\n", json),
            // chunks are plain data and always serialize; keep the stream well formed regardless
            Err(e) => format!(
                "data: {}\n\n",
                serde_json::json!({"type": "error", "errorText": e.to_string()})
            ),
        }
    }
}

/// Stateful translation of one run's agent events into UI chunks
#[derive(Debug)]
pub struct UiStreamEncoder {
    message_id: String,
    started: bool,
    text_open: bool,
    text_counter: u32,
    finished: bool,
}

impl UiStreamEncoder {
    pub fn new<S: Into<String>>(message_id: S) -> Self {
        Self {
            message_id: message_id.into(),
            started: false,
            text_open: false,
            text_counter: 0,
            finished: false,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn text_id(&self) -> String {
        format!("txt_{}", self.text_counter)
    }

    fn close_text(&mut self, chunks: &mut Vec<UiChunk>) {
        if self.text_open {
            chunks.push(UiChunk::TextEnd { id: self.text_id() });
            self.text_open = false;
            self.text_counter += 1;
        }
    }

    fn start(&mut self, chunks: &mut Vec<UiChunk>) {
        if !self.started {
            self.started = true;
            chunks.push(UiChunk::MessageStart {
                message_id: self.message_id.clone(),
            });
            chunks.push(UiChunk::StartStep);
        }
    }

    /// Chunks for one event. Events after the terminal one produce nothing.
    pub fn on_event(&mut self, event: &AgentEvent) -> Vec<UiChunk> {
        let mut chunks = Vec::new();
        if self.finished {
            return chunks;
        }
        self.start(&mut chunks);

        match event {
            AgentEvent::RunStart => {}
            AgentEvent::TextDelta { delta } => {
                if !self.text_open {
                    self.text_open = true;
                    chunks.push(UiChunk::TextStart { id: self.text_id() });
                }
                chunks.push(UiChunk::TextDelta {
                    id: self.text_id(),
                    delta: delta.clone(),
                });
            }
            AgentEvent::ToolCallStart { id, name } => {
                self.close_text(&mut chunks);
                chunks.push(UiChunk::ToolInputStart {
                    tool_call_id: id.clone(),
                    tool_name: name.clone(),
                });
            }
            AgentEvent::ToolCallEnd { id, name, input } => {
                chunks.push(UiChunk::ToolInputAvailable {
                    tool_call_id: id.clone(),
                    tool_name: name.clone(),
                    input: input.clone(),
                });
            }
            AgentEvent::ToolResult { id, output } => {
                chunks.push(UiChunk::ToolOutputAvailable {
                    tool_call_id: id.clone(),
                    output: output.clone(),
                });
            }
            AgentEvent::RunFinish { finish_reason } => {
                self.finish_with(Some(*finish_reason), &mut chunks);
            }
            AgentEvent::Error { message } => {
                self.finished = true;
                self.text_open = false;
                chunks.push(UiChunk::Error {
                    error_text: message.clone(),
                });
            }
        }
        chunks
    }

    /// Close a run whose events ended without a terminal event.
    pub fn finish(&mut self) -> Vec<UiChunk> {
        let mut chunks = Vec::new();
        if !self.finished {
            self.start(&mut chunks);
            self.finish_with(Some(FinishReason::Other), &mut chunks);
        }
        chunks
    }

    fn finish_with(&mut self, finish_reason: Option<FinishReason>, chunks: &mut Vec<UiChunk>) {
        self.close_text(chunks);
        self.finished = true;
        chunks.push(UiChunk::FinishStep);
        chunks.push(UiChunk::Finish { finish_reason });
    }
}

/// Lazily translate an event stream into UI chunks, preserving order.
///
/// The output always ends with exactly one `finish` or `error` chunk.
pub fn into_ui_stream<S>(events: S, mut encoder: UiStreamEncoder) -> BoxStream<'static, UiChunk>
where
    S: Stream<Item = AgentEvent> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut events = Box::pin(events);
        while let Some(event) = events.next().await {
            for chunk in encoder.on_event(&event) {
                yield chunk;
            }
            if encoder.is_finished() {
                break;
            }
        }
        for chunk in encoder.finish() {
            yield chunk;
        }
    })
}

/// The complete server-sent event body for a run, `[DONE]` included.
pub fn into_sse_stream<S>(events: S, encoder: UiStreamEncoder) -> BoxStream<'static, String>
where
    S: Stream<Item = AgentEvent> + Send + 'static,
{
    into_ui_stream(events, encoder)
        .map(|chunk| chunk.to_sse())
        .chain(futures::stream::once(async { SSE_DONE.to_string() }))
        .boxed()
}
