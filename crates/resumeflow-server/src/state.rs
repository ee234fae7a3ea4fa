use resumeflow::agent::{Agent, AgentConfig};
use resumeflow::providers::base::Provider;
use std::sync::Arc;

use crate::configuration::LoginVariant;
use crate::session::SessionProvider;

/// Shared application state
///
/// Everything here is read-only; each request builds its own agent from it.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn Provider>,
    pub agent_config: Arc<AgentConfig>,
    pub sessions: Arc<dyn SessionProvider>,
    pub login_variant: LoginVariant,
    pub require_session: bool,
}

impl AppState {
    pub fn agent(&self) -> Agent {
        Agent::new(self.provider.clone(), self.agent_config.as_ref().clone())
    }
}

#[cfg(test)]
impl AppState {
    /// State with the default agent, no session provider and the client login page
    pub fn for_tests(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            agent_config: Arc::new(AgentConfig::default()),
            sessions: Arc::new(crate::session::NoSession),
            login_variant: LoginVariant::Client,
            require_session: false,
        }
    }
}
