/// Persona, capabilities, objectives, tone and boundaries of the ResumeFlow agent.
///
/// Handed to [`crate::agent::AgentConfig`] explicitly; nothing reads it as
/// global state.
pub const RESUMEFLOW_SYSTEM_PROMPT: &str = include_str!("prompts/system.md");
