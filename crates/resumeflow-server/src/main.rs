mod configuration;
mod error;
mod routes;
mod session;
mod state;

use configuration::Settings;
use resumeflow::agent::AgentConfig;
use resumeflow::providers::factory;
use session::{NoSession, RemoteSessionProvider, SessionProvider};
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let settings = Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let provider = factory::get_provider(settings.provider.into_config())?;
    let sessions: Arc<dyn SessionProvider> = match settings.auth.session_url {
        Some(url) => Arc::new(RemoteSessionProvider::new(url)?),
        None => Arc::new(NoSession),
    };
    info!(
        model = provider.model(),
        login = settings.login.variant.as_str(),
        require_session = settings.auth.require_session,
        "configured agent"
    );

    let state = AppState {
        provider,
        agent_config: Arc::new(AgentConfig::default()),
        sessions,
        login_variant: settings.login.variant,
        require_session: settings.auth.require_session,
    };

    // Create router with CORS support
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
