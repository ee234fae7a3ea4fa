//! These models represent the objects passed around by the agent
//!
//! There are several different related formats we need to interact with:
//! - vercel useChat messages, sent from the interface to the chat endpoint
//! - vercel UI message stream chunks, sent from the agent to the interface
//! - openai chat completion messages and stream deltas, exchanged with the LLM
//!
//! We always immediately convert those data models into the internal structs.
//! The external message shape lives in [`external`], the agent-side shape in
//! [`message`], and the incremental output of a run in [`event`].
pub mod event;
pub mod external;
pub mod message;
pub mod role;
pub mod tool;
