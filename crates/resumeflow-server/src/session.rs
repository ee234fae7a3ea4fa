use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::http::{header::COOKIE, HeaderMap};
use serde_json::Value;
use std::time::Duration;

/// An opaque session object returned by the authentication provider
#[derive(Debug, Clone, PartialEq)]
pub struct Session(pub Value);

/// Looks up the session belonging to an incoming request
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>>;
}

/// Used when no authentication provider is configured
pub struct NoSession;

#[async_trait]
impl SessionProvider for NoSession {
    async fn session(&self, _headers: &HeaderMap) -> Result<Option<Session>> {
        Ok(None)
    }
}

/// Asks a remote endpoint for the session, forwarding the visitor's cookies.
///
/// 200 with a JSON body is a session; 401, 204 and 404 mean signed out.
pub struct RemoteSessionProvider {
    client: reqwest::Client,
    url: String,
}

impl RemoteSessionProvider {
    pub fn new<S: Into<String>>(url: S) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SessionProvider for RemoteSessionProvider {
    async fn session(&self, headers: &HeaderMap) -> Result<Option<Session>> {
        let mut request = self.client.get(&self.url);
        if let Some(cookie) = headers.get(COOKIE).and_then(|v| v.to_str().ok()) {
            request = request.header("cookie", cookie);
        }

        let response = request.send().await?;
        match response.status().as_u16() {
            200 => {
                let body: Value = response.json().await?;
                Ok((!body.is_null()).then_some(Session(body)))
            }
            204 | 401 | 404 => Ok(None),
            status => Err(anyhow!("Session lookup failed with status {}", status)),
        }
    }
}
