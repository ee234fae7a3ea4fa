use thiserror::Error;

/// Failures talking to the language model provider
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request to provider failed: {0}")]
    Transport(String),

    #[error("Could not decode provider response: {0}")]
    Decode(String),

    #[error("Invalid provider configuration: {0}")]
    Config(String),
}

impl ProviderError {
    /// The HTTP status reported by the provider, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ProviderError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AgentError {
    pub fn status(&self) -> Option<u16> {
        match self {
            AgentError::Provider(err) => err.status(),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
