use serde::{Deserialize, Serialize};

/// The speaker of an agent-form message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
    System,
}

impl Role {
    /// Map a role name used by the chat UI onto the agent role table.
    pub fn from_external(role: &str) -> Option<Role> {
        match role {
            "user" => Some(Role::Human),
            "assistant" => Some(Role::Ai),
            "system" => Some(Role::System),
            _ => None,
        }
    }

    /// The inverse of [`Role::from_external`].
    pub fn as_external(&self) -> &'static str {
        match self {
            Role::Human => "user",
            Role::Ai => "assistant",
            Role::System => "system",
        }
    }

    /// Role name on the openai chat completions wire.
    pub fn as_openai(&self) -> &'static str {
        // openai shares the chat UI vocabulary
        self.as_external()
    }
}
