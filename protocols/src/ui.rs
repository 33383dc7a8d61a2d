//! Client-facing UI message model.
//!
//! Chat requests carry an ordered list of [`ClientMessage`]s. A message has a
//! flat `content` string, an ordered list of typed [`MessagePart`]s, or both;
//! for non-system roles at least one of the two must yield a non-empty
//! payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Role of a UI message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One message in the UI conversation history.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientMessage {
    pub role: Role,

    /// Flat text content. Optional when `parts` carries the payload.
    pub content: Option<String>,

    /// Ordered message parts (text, reasoning, tool invocations, files).
    pub parts: Option<Vec<MessagePart>>,
}

impl ClientMessage {
    /// Build a plain-text message for the given role.
    pub fn text(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            parts: None,
        }
    }

    /// System message helper, used when prepending prompt and skill context.
    pub fn system(content: impl Into<String>) -> Self {
        Self::text(Role::System, content)
    }

    /// True when the message carries a non-empty payload in either field.
    ///
    /// System messages are exempt; an empty system message is pointless but
    /// harmless and is passed through unchanged.
    pub fn has_payload(&self) -> bool {
        if self.role == Role::System {
            return true;
        }
        if self.content.as_deref().is_some_and(|c| !c.is_empty()) {
            return true;
        }
        self.parts.as_deref().is_some_and(|parts| {
            parts.iter().any(|p| match p {
                MessagePart::Text { text } | MessagePart::Reasoning { text } => !text.is_empty(),
                MessagePart::ToolInvocation { .. } | MessagePart::FileReference { .. } => true,
            })
        })
    }
}

/// Typed message part inside `ClientMessage::parts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MessagePart {
    Text {
        text: String,
    },
    Reasoning {
        text: String,
    },
    ToolInvocation {
        #[serde(rename = "toolInvocation")]
        tool_invocation: Value,
    },
    FileReference {
        url: String,
        #[serde(rename = "mediaType")]
        media_type: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_flat_content() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"role":"user","content":"Hi"}"#).unwrap();
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content.as_deref(), Some("Hi"));
        assert!(msg.parts.is_none());
        assert!(msg.has_payload());
    }

    #[test]
    fn test_deserialize_parts() {
        let raw = r#"{
            "role": "assistant",
            "parts": [
                {"type": "text", "text": "hello"},
                {"type": "reasoning", "text": "thinking"},
                {"type": "file-reference", "url": "https://x/y.png", "mediaType": "image/png"}
            ]
        }"#;
        let msg: ClientMessage = serde_json::from_str(raw).unwrap();
        let parts = msg.parts.unwrap();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], MessagePart::Text { text } if text == "hello"));
        assert!(matches!(
            &parts[2],
            MessagePart::FileReference { media_type, .. } if media_type == "image/png"
        ));
    }

    #[test]
    fn test_empty_user_message_has_no_payload() {
        let msg = ClientMessage {
            role: Role::User,
            content: Some(String::new()),
            parts: Some(vec![]),
        };
        assert!(!msg.has_payload());
    }

    #[test]
    fn test_system_message_always_counts_as_payload() {
        let msg = ClientMessage {
            role: Role::System,
            content: None,
            parts: None,
        };
        assert!(msg.has_payload());
    }
}
