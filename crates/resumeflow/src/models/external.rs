use serde::{Deserialize, Serialize};

/// A chat message as posted by the `useChat` client.
///
/// Older clients send `content` as a string or as a list of parts, newer
/// ones send a `parts` list. When both are present `content` wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ExternalContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parts: Option<Vec<ExternalPart>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExternalContent {
    Text(String),
    Parts(Vec<ExternalPart>),
}

/// One entry of a multi-part message. Only `text` parts carry content the
/// agent understands; files, reasoning and tool parts are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalPart {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ExternalPart {
    pub fn text<S: Into<String>>(text: S) -> Self {
        ExternalPart {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }

    fn as_text(&self) -> Option<&str> {
        if self.kind == "text" {
            self.text.as_deref()
        } else {
            None
        }
    }
}

impl ExternalMessage {
    pub fn new<R: Into<String>, S: Into<String>>(role: R, content: S) -> Self {
        ExternalMessage {
            id: None,
            role: role.into(),
            content: Some(ExternalContent::Text(content.into())),
            parts: None,
        }
    }

    pub fn with_parts<R: Into<String>>(role: R, parts: Vec<ExternalPart>) -> Self {
        ExternalMessage {
            id: None,
            role: role.into(),
            content: None,
            parts: Some(parts),
        }
    }

    /// The message text with all text parts joined in order.
    pub fn text(&self) -> String {
        match (&self.content, &self.parts) {
            (Some(ExternalContent::Text(text)), _) => text.clone(),
            (Some(ExternalContent::Parts(parts)), _) | (None, Some(parts)) => join_parts(parts),
            (None, None) => String::new(),
        }
    }
}

fn join_parts(parts: &[ExternalPart]) -> String {
    parts.iter().filter_map(ExternalPart::as_text).collect()
}
