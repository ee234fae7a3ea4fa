use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use resumeflow::providers::configs::{
    OpenAiProviderConfig, ProviderConfig, OPENAI_HOST, OPENAI_MODEL,
};
use serde::Deserialize;
use std::net::{AddrParseError, SocketAddr};

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openai_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    pub fn into_config(self) -> ProviderConfig {
        ProviderConfig::OpenAi(OpenAiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

/// Which login page behavior to serve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginVariant {
    /// The button only shows a toast and logs to the browser console
    #[default]
    Client,
    /// The server looks up the visitor's session and logs it
    Session,
}

impl LoginVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginVariant::Client => "client",
            LoginVariant::Session => "session",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginSettings {
    #[serde(default)]
    pub variant: LoginVariant,
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthSettings {
    /// Endpoint returning the current session as JSON, queried with the visitor's cookies
    #[serde(default)]
    pub session_url: Option<String>,
    /// Reject chat requests that carry no session
    #[serde(default)]
    pub require_session: bool,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub login: LoginSettings,
    #[serde(default)]
    pub auth: AuthSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            .set_default("provider.host", default_openai_host())?
            .set_default("provider.model", default_model())?
            .add_source(
                Environment::with_prefix("RESUMEFLOW")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Self = match config.try_deserialize() {
            Ok(settings) => settings,
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);
                return Err(match missing_field(&err) {
                    Some(field) => ConfigError::MissingEnvVar {
                        env_var: to_env_var(&field),
                    },
                    None => ConfigError::Other(err),
                });
            }
        };

        // set but blank
        if settings.provider.api_key.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar {
                env_var: to_env_var("provider.api_key"),
            });
        }

        Ok(settings)
    }
}

/// Field name out of errors like "missing field `api_key` for key `provider`"
fn missing_field(err: &config::ConfigError) -> Option<String> {
    if let config::ConfigError::NotFound(field) = err {
        return Some(field.clone());
    }
    let message = err.to_string();
    let rest = message.split("missing field `").nth(1)?;
    rest.split('`').next().map(str::to_string)
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    OPENAI_MODEL.to_string()
}

fn default_openai_host() -> String {
    OPENAI_HOST.to_string()
}
