use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool the model may call. ResumeFlow currently ships with none, but the
/// provider layer forwards whatever the agent is configured with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tool {
    pub name: String,
    pub description: String,
    /// JSON schema describing the arguments
    pub input_schema: Value,
}

impl Tool {
    pub fn new<N, D>(name: N, description: D, input_schema: Value) -> Self
    where
        N: Into<String>,
        D: Into<String>,
    {
        Tool {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}
