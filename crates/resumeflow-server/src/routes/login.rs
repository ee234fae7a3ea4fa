use crate::configuration::LoginVariant;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
    routing::get,
    Router,
};
use resumeflow::template::render;
use serde_json::json;

const LOGIN_TEMPLATE: &str = include_str!("../templates/login.html");
const APP_NAME: &str = "ResumeFlow";

/// Serve the login view.
///
/// The page never gates access. With the `session` variant the visitor's
/// session is looked up and logged, but the markup does not depend on it.
async fn login_page(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Html<String>, ApiError> {
    if state.login_variant == LoginVariant::Session {
        match state.sessions.session(&headers).await {
            Ok(Some(session)) => {
                tracing::debug!(session = ?session.0, "login page visited with a session")
            }
            Ok(None) => tracing::debug!("login page visited without a session"),
            Err(e) => tracing::warn!("Session lookup failed: {}", e),
        }
    }

    let context = json!({
        "app_name": APP_NAME,
        "variant": state.login_variant.as_str(),
    });
    render(LOGIN_TEMPLATE, &context)
        .map(Html)
        .map_err(|e| ApiError::Internal(format!("Failed to render login page: {}", e)))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(login_page))
        .route("/login", get(login_page))
        .with_state(state)
}
