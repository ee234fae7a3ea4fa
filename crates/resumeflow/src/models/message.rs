use super::role::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A single turn of the conversation in the form the agent consumes
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Message {
            role,
            content: content.into(),
        }
    }

    pub fn human<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Human, content)
    }

    pub fn ai<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Ai, content)
    }

    pub fn system<S: Into<String>>(content: S) -> Self {
        Self::new(Role::System, content)
    }
}
