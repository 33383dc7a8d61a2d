//! UI message to provider message conversion.
//!
//! System messages flow through as strings. User and assistant messages with
//! `parts` flatten to a string when every part is text, and to a typed part
//! array when a file reference is present (multimodal providers). Reasoning
//! and tool-invocation parts in the history carry no payload the provider
//! needs and are dropped.

use chat_protocol::{
    ChatMessage, ClientMessage, ContentPart, ImageUrl, MessageContent, MessagePart, Role,
};

pub fn to_chat_messages(messages: &[ClientMessage]) -> Vec<ChatMessage> {
    messages.iter().map(to_chat_message).collect()
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

fn to_chat_message(message: &ClientMessage) -> ChatMessage {
    let role = role_str(message.role);

    let content = match (&message.parts, &message.content) {
        (Some(parts), _) if !parts.is_empty() => convert_parts(parts),
        (_, Some(content)) => Some(MessageContent::Text(content.clone())),
        _ => None,
    };

    ChatMessage {
        role: role.to_string(),
        content,
        tool_calls: None,
        tool_call_id: None,
        name: None,
    }
}

fn convert_parts(parts: &[MessagePart]) -> Option<MessageContent> {
    let has_files = parts
        .iter()
        .any(|part| matches!(part, MessagePart::FileReference { .. }));

    if !has_files {
        let texts: Vec<&str> = parts
            .iter()
            .filter_map(|part| match part {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if texts.is_empty() {
            return None;
        }
        return Some(MessageContent::Text(texts.join("\n")));
    }

    let typed: Vec<ContentPart> = parts
        .iter()
        .filter_map(|part| match part {
            MessagePart::Text { text } => Some(ContentPart::Text { text: text.clone() }),
            MessagePart::FileReference { url, .. } => Some(ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.clone() },
            }),
            _ => None,
        })
        .collect();
    Some(MessageContent::Parts(typed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_content_passes_through() {
        let messages = vec![
            ClientMessage::system("be brief"),
            ClientMessage::text(Role::User, "Hi"),
        ];
        let converted = to_chat_messages(&messages);
        assert_eq!(converted[0].role, "system");
        assert!(matches!(
            converted[0].content,
            Some(MessageContent::Text(ref text)) if text == "be brief"
        ));
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn test_all_text_parts_flatten_to_string() {
        let message = ClientMessage {
            role: Role::Assistant,
            content: None,
            parts: Some(vec![
                MessagePart::Text {
                    text: "first".to_string(),
                },
                MessagePart::Reasoning {
                    text: "private".to_string(),
                },
                MessagePart::Text {
                    text: "second".to_string(),
                },
            ]),
        };
        let converted = to_chat_message(&message);
        assert!(matches!(
            converted.content,
            Some(MessageContent::Text(ref text)) if text == "first\nsecond"
        ));
    }

    #[test]
    fn test_file_parts_become_typed_array() {
        let message = ClientMessage {
            role: Role::User,
            content: None,
            parts: Some(vec![
                MessagePart::Text {
                    text: "look at this".to_string(),
                },
                MessagePart::FileReference {
                    url: "https://x/y.png".to_string(),
                    media_type: "image/png".to_string(),
                },
            ]),
        };
        let converted = to_chat_message(&message);
        let Some(MessageContent::Parts(parts)) = converted.content else {
            panic!("expected typed parts");
        };
        assert_eq!(parts.len(), 2);
        assert!(matches!(
            &parts[1],
            ContentPart::ImageUrl { image_url } if image_url.url == "https://x/y.png"
        ));
    }

    #[test]
    fn test_parts_take_precedence_over_content() {
        let message = ClientMessage {
            role: Role::User,
            content: Some("ignored".to_string()),
            parts: Some(vec![MessagePart::Text {
                text: "used".to_string(),
            }]),
        };
        let converted = to_chat_message(&message);
        assert!(matches!(
            converted.content,
            Some(MessageContent::Text(ref text)) if text == "used"
        ));
    }
}
