use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use resumeflow::convert::ConvertError;
use resumeflow::errors::AgentError;
use serde_json::json;
use thiserror::Error;

const ENV_PREFIX: &str = "RESUMEFLOW";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Environment variable that sets a dotted configuration key
pub fn to_env_var(field_path: &str) -> String {
    // serde reports the missing key without its parent table
    let normalized_path = match field_path {
        "api_key" => format!("provider.{}", field_path),
        _ => field_path.to_string(),
    };

    format!(
        "{}_{}",
        ENV_PREFIX,
        normalized_path.replace('.', "__").to_uppercase()
    )
}

/// Errors surfaced by the HTTP API as `{"error": message}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Parse(String),
    #[error(transparent)]
    UnsupportedRole(#[from] ConvertError),
    #[error("A signed-in session is required")]
    Unauthorized,
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Parse(_) | ApiError::UnsupportedRole(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Agent(err) => err
                .status()
                .and_then(|status| StatusCode::from_u16(status).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = status.as_u16(), "{}", self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resumeflow::errors::ProviderError;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("api_key"), "RESUMEFLOW_PROVIDER__API_KEY");
        assert_eq!(to_env_var("provider.model"), "RESUMEFLOW_PROVIDER__MODEL");
        assert_eq!(to_env_var("model"), "RESUMEFLOW_MODEL");
        assert_eq!(to_env_var("server.port"), "RESUMEFLOW_SERVER__PORT");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Parse("bad json".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);

        let limited = ApiError::from(AgentError::from(ProviderError::Api {
            status: 429,
            message: "slow down".to_string(),
        }));
        assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

        let transport = ApiError::from(AgentError::from(ProviderError::Transport(
            "dns failure".to_string(),
        )));
        assert_eq!(transport.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bogus = ApiError::from(AgentError::from(ProviderError::Api {
            status: 42,
            message: "odd".to_string(),
        }));
        assert_eq!(bogus.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
