use thiserror::Error;

use crate::models::external::ExternalMessage;
use crate::models::message::Message;
use crate::models::role::Role;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Unsupported role '{role}' in message {index}")]
    UnsupportedRole { index: usize, role: String },
}

/// Convert chat UI messages into the messages the agent consumes.
///
/// The output has the same length and order as the input. A single message
/// with an unknown role rejects the whole history.
pub fn convert_messages(incoming: &[ExternalMessage]) -> Result<Vec<Message>, ConvertError> {
    incoming
        .iter()
        .enumerate()
        .map(|(index, msg)| {
            let role =
                Role::from_external(&msg.role).ok_or_else(|| ConvertError::UnsupportedRole {
                    index,
                    role: msg.role.clone(),
                })?;
            Ok(Message::new(role, msg.text()))
        })
        .collect()
}
