use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use futures::{stream::BoxStream, Stream, StreamExt};
use resumeflow::{
    convert::convert_messages,
    models::external::ExternalMessage,
    ui_stream::{into_sse_stream, UiStreamEncoder, UI_MESSAGE_STREAM_HEADER, UI_MESSAGE_STREAM_VERSION},
};
use serde::Deserialize;
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

const PROTOCOL_HEADER: &str = "x-protocol";
const PROTOCOL: &str = "ui-message";

// A body without `messages` is an empty conversation
#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    messages: Vec<ExternalMessage>,
}

/// Streamed response body in the AI SDK UI message stream protocol
pub struct SseResponse {
    rx: ReceiverStream<String>,
}

impl SseResponse {
    fn new(rx: ReceiverStream<String>) -> Self {
        Self { rx }
    }
}

impl Stream for SseResponse {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx)
            .poll_next(cx)
            .map(|opt| opt.map(|s| Ok(Bytes::from(s))))
    }
}

impl IntoResponse for SseResponse {
    fn into_response(self) -> Response {
        let headers = [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (
                HeaderName::from_static(UI_MESSAGE_STREAM_HEADER),
                UI_MESSAGE_STREAM_VERSION,
            ),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ];
        (headers, Body::from_stream(self)).into_response()
    }
}

/// Drain the encoded reply into the response channel.
///
/// The heartbeat lets a slow model notice that the client went away.
async fn pump(mut body: BoxStream<'static, String>, tx: mpsc::Sender<String>) {
    loop {
        match timeout(Duration::from_millis(500), body.next()).await {
            Ok(Some(chunk)) => {
                if let Err(e) = tx.send(chunk).await {
                    tracing::warn!("Client disconnected, dropping reply: {}", e);
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("reply stream complete");
                break;
            }
            Err(_) => {
                if tx.is_closed() {
                    tracing::warn!("Client disconnected while waiting on the model");
                    break;
                }
            }
        }
    }
}

async fn handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<SseResponse, ApiError> {
    // Check protocol header (optional)
    if let Some(protocol) = headers.get(PROTOCOL_HEADER) {
        if protocol.to_str().map(|p| p != PROTOCOL).unwrap_or(true) {
            return Err(ApiError::Parse(format!(
                "Unsupported protocol, expected '{}'",
                PROTOCOL
            )));
        }
    }

    // The body is JSON whatever content type the client declared
    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::Parse(format!("Invalid chat request: {}", e)))?;

    if state.require_session {
        match state.sessions.session(&headers).await {
            Ok(Some(_)) => {}
            Ok(None) => return Err(ApiError::Unauthorized),
            Err(e) => {
                return Err(ApiError::Internal(format!("Could not look up session: {}", e)));
            }
        }
    }

    tracing::info!(messages = request.messages.len(), "chat request");
    let messages = convert_messages(&request.messages)?;

    let agent = state.agent();
    let events = agent.reply(&messages).await?;

    let message_id = format!("msg_{}", Uuid::new_v4().simple());
    let body = into_sse_stream(events, UiStreamEncoder::new(message_id));

    let (tx, rx) = mpsc::channel(100);
    tokio::spawn(pump(body, tx));

    Ok(SseResponse::new(ReceiverStream::new(rx)))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/api/chat", post(handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionProvider};
    use async_trait::async_trait;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use resumeflow::errors::ProviderError;
    use resumeflow::models::message::Message;
    use resumeflow::providers::base::ProviderEvent;
    use resumeflow::providers::mock::MockProvider;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    struct SignedIn;

    #[async_trait]
    impl SessionProvider for SignedIn {
        async fn session(&self, _headers: &HeaderMap) -> anyhow::Result<Option<Session>> {
            Ok(Some(Session(json!({"user": "ada"}))))
        }
    }

    struct AuthDown;

    #[async_trait]
    impl SessionProvider for AuthDown {
        async fn session(&self, _headers: &HeaderMap) -> anyhow::Result<Option<Session>> {
            Err(anyhow::anyhow!("Session lookup failed with status 503"))
        }
    }

    fn post_chat(body: &str) -> Request<Body> {
        Request::post("/api/chat")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Parse the `data:` events of a streamed body, `[DONE]` excluded
    fn chunks(body: &str) -> Vec<Value> {
        body.split("\n\n")
            .filter_map(|event| event.strip_prefix("data: "))
            .filter(|data| *data != "[DONE]")
            .map(|data| serde_json::from_str(data).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_resume_review_streams_text() {
        let provider = Arc::new(MockProvider::with_text(&["Your summary ", "is strong."]));
        let app = routes(AppState::for_tests(provider.clone()));

        let response = app
            .oneshot(post_chat(
                r#"{"messages":[{"role":"user","content":"Review my resume summary: ..."}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        assert_eq!(response.headers()["x-vercel-ai-ui-message-stream"], "v1");

        let body = body_text(response).await;
        assert!(body.ends_with("data: [DONE]\n\n"));

        let chunks = chunks(&body);
        let deltas: Vec<&str> = chunks
            .iter()
            .filter(|c| c["type"] == "text-delta")
            .map(|c| c["delta"].as_str().unwrap())
            .collect();
        assert_eq!(deltas, vec!["Your summary ", "is strong."]);
        assert_eq!(chunks.first().unwrap()["type"], "start");
        assert_eq!(chunks.last().unwrap()["type"], "finish");

        assert_eq!(
            provider.requests(),
            vec![vec![Message::human("Review my resume summary: ...")]]
        );
    }

    #[tokio::test]
    async fn test_missing_messages_is_empty_conversation() {
        let provider = Arc::new(MockProvider::with_text(&["Hi! Share your resume."]));
        let app = routes(AppState::for_tests(provider.clone()));

        let response = app.oneshot(post_chat("{}")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await;

        assert_eq!(provider.requests(), vec![Vec::<Message>::new()]);
    }

    #[tokio::test]
    async fn test_provider_status_is_forwarded() {
        let provider = Arc::new(MockProvider::rejecting(ProviderError::Api {
            status: 429,
            message: "Rate limit reached".to_string(),
        }));
        let app = routes(AppState::for_tests(provider));

        let response = app
            .oneshot(post_chat(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(
            body,
            json!({"error": "Provider returned 429: Rate limit reached"})
        );
    }

    #[tokio::test]
    async fn test_provider_failure_without_status_is_500() {
        let provider = Arc::new(MockProvider::rejecting(ProviderError::Transport(
            "dns failure".to_string(),
        )));
        let app = routes(AppState::for_tests(provider));

        let response = app
            .oneshot(post_chat(r#"{"messages":[]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("dns failure"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let provider = Arc::new(MockProvider::with_text(&["unused"]));
        let app = routes(AppState::for_tests(provider.clone()));

        let response = app.oneshot(post_chat("{\"messages\": [")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["error"].is_string());
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_role_is_400() {
        let provider = Arc::new(MockProvider::with_text(&["unused"]));
        let app = routes(AppState::for_tests(provider.clone()));

        let response = app
            .oneshot(post_chat(
                r#"{"messages":[{"role":"user","content":"hi"},{"role":"tool","content":"{}"}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "Unsupported role 'tool' in message 1");
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_mid_stream_failure_becomes_error_chunk() {
        let provider = Arc::new(MockProvider::new(vec![
            Ok(ProviderEvent::TextDelta("Let me".to_string())),
            Err(ProviderError::Transport("connection reset".to_string())),
        ]));
        let app = routes(AppState::for_tests(provider));

        let response = app
            .oneshot(post_chat(r#"{"messages":[{"role":"user","content":"hi"}]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_text(response).await;
        assert!(body.ends_with("data: [DONE]\n\n"));
        let chunks = chunks(&body);
        assert_eq!(
            chunks.last().unwrap(),
            &json!({"type": "error", "errorText": "Request to provider failed: connection reset"})
        );
    }

    #[tokio::test]
    async fn test_protocol_header_mismatch() {
        let provider = Arc::new(MockProvider::with_text(&["unused"]));
        let app = routes(AppState::for_tests(provider));

        let request = Request::post("/api/chat")
            .header("content-type", "application/json")
            .header("x-protocol", "text")
            .body(Body::from(r#"{"messages":[]}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_required_session() {
        let provider = Arc::new(MockProvider::with_text(&["ok"]));
        let mut state = AppState::for_tests(provider);
        state.require_session = true;

        let response = routes(state.clone())
            .oneshot(post_chat(r#"{"messages":[]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        state.sessions = Arc::new(SignedIn);
        let response = routes(state)
            .oneshot(post_chat(r#"{"messages":[]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_session_lookup_failure_is_500() {
        let provider = Arc::new(MockProvider::with_text(&["unused"]));
        let mut state = AppState::for_tests(provider.clone());
        state.require_session = true;
        state.sessions = Arc::new(AuthDown);

        let response = routes(state)
            .oneshot(post_chat(r#"{"messages":[]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["error"].as_str().unwrap().contains("503"));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_body_is_parsed_without_content_type() {
        let provider = Arc::new(MockProvider::with_text(&["Hello"]));
        let app = routes(AppState::for_tests(provider.clone()));

        let request = Request::post("/api/chat")
            .body(Body::from(r#"{"messages":[{"role":"user","content":"Hi"}]}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await;

        assert_eq!(provider.requests(), vec![vec![Message::human("Hi")]]);
    }
}
