use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{Provider, ProviderEvent, ProviderStream};
use super::configs::OpenAiProviderConfig;
use super::sse::SseLineBuffer;
use super::utils::{
    messages_to_openai_spec, openai_error_message, tools_to_openai_spec, OpenAiDeltaDecoder,
};
use crate::errors::ProviderError;
use crate::models::message::Message;
use crate::models::tool::Tool;

pub struct OpenAiProvider {
    client: Client,
    config: OpenAiProviderConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiProviderConfig) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::Config("OpenAI api key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    fn build_payload(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<Value, ProviderError> {
        let system_message = json!({
            "role": "system",
            "content": system
        });

        let mut messages_array = vec![system_message];
        messages_array.extend(messages_to_openai_spec(messages));

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages_array,
            "stream": true,
            "stream_options": {"include_usage": true},
        });

        let tools_spec = tools_to_openai_spec(tools)?;
        if !tools_spec.is_empty() {
            payload["tools"] = json!(tools_spec);
        }
        if let Some(temp) = self.config.temperature {
            payload["temperature"] = json!(temp);
        }
        if let Some(tokens) = self.config.max_tokens {
            payload["max_tokens"] = json!(tokens);
        }

        Ok(payload)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn stream(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Tool],
    ) -> Result<ProviderStream, ProviderError> {
        let payload = self.build_payload(system, messages, tools)?;
        let url = format!(
            "{}/v1/chat/completions",
            self.config.host.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let mut message = openai_error_message(&body);
            if message.is_empty() {
                message = status.canonical_reason().unwrap_or("request failed").to_string();
            }
            tracing::warn!(status = status.as_u16(), %message, "openai rejected completion");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(decode_event_stream(response.bytes_stream()).boxed())
    }
}

/// Decode a chat completions SSE body into provider events.
pub fn decode_event_stream<S, B, E>(
    bytes: S,
) -> impl Stream<Item = Result<ProviderEvent, ProviderError>> + Send + 'static
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
{
    async_stream::try_stream! {
        let mut bytes = Box::pin(bytes);
        let mut lines = SseLineBuffer::new();
        let mut decoder = OpenAiDeltaDecoder::new();

        while let Some(chunk) = bytes.next().await {
            let chunk = chunk.map_err(|e| -> ProviderError { e.into() })?;
            for data in lines.push(chunk.as_ref()) {
                for event in decoder.on_data(&data)? {
                    yield event;
                }
            }
            if decoder.is_done() {
                break;
            }
        }

        if let Some(data) = lines.finish() {
            for event in decoder.on_data(&data)? {
                yield event;
            }
        }
        for event in decoder.finish() {
            yield event;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::FinishReason;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(texts: &[&str]) -> String {
        let mut body = String::new();
        for text in texts {
            let chunk = json!({
                "id": "chatcmpl-1",
                "object": "chat.completion.chunk",
                "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
            });
            body.push_str(&format!("data: {}\n\n", chunk));
        }
        let stop = json!({"choices": [{"index": 0, "delta": {}, "finish_reason": "stop"}]});
        body.push_str(&format!("data: {}\n\n", stop));
        body.push_str("data: [DONE]\n\n");
        body
    }

    async fn setup_provider(server: &MockServer) -> OpenAiProvider {
        let config = OpenAiProviderConfig {
            host: server.uri(),
            api_key: "test_api_key".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
        };
        OpenAiProvider::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_stream_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o-mini",
                "stream": true,
                "messages": [
                    {"role": "system", "content": "You are a helpful assistant."},
                    {"role": "user", "content": "Hello?"}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body(&["Hello", "! How can I help?"])),
            )
            .mount(&server)
            .await;

        let provider = setup_provider(&server).await;
        let events: Vec<ProviderEvent> = provider
            .stream("You are a helpful assistant.", &[Message::human("Hello?")], &[])
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                ProviderEvent::TextDelta("Hello".to_string()),
                ProviderEvent::TextDelta("! How can I help?".to_string()),
                ProviderEvent::Finish {
                    reason: FinishReason::Stop,
                    usage: None
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_json(json!({
                "error": {"message": "Rate limit reached for gpt-4o-mini", "type": "requests"}
            })))
            .mount(&server)
            .await;

        let provider = setup_provider(&server).await;
        let err = match provider.stream("system", &[Message::human("hi")], &[]).await {
            Ok(_) => panic!("expected the request to be rejected"),
            Err(err) => err,
        };

        assert_eq!(
            err,
            ProviderError::Api {
                status: 429,
                message: "Rate limit reached for gpt-4o-mini".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_decode_split_chunks() {
        let body = sse_body(&["Split"]);
        let (head, tail) = body.split_at(17);
        let chunks: Vec<Result<Vec<u8>, ProviderError>> =
            vec![Ok(head.as_bytes().to_vec()), Ok(tail.as_bytes().to_vec())];

        let events: Vec<ProviderEvent> = decode_event_stream(futures::stream::iter(chunks))
            .try_collect()
            .await
            .unwrap();

        assert_eq!(events[0], ProviderEvent::TextDelta("Split".to_string()));
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn test_decode_transport_error() {
        let chunks: Vec<Result<Vec<u8>, ProviderError>> = vec![
            Ok(b"data: ".to_vec()),
            Err(ProviderError::Transport("connection reset".to_string())),
        ];

        let result: Result<Vec<ProviderEvent>, ProviderError> =
            decode_event_stream(futures::stream::iter(chunks))
                .try_collect()
                .await;
        assert_eq!(
            result,
            Err(ProviderError::Transport("connection reset".to_string()))
        );
    }
}
