//! UI event stream model.
//!
//! The closed set of events emitted to the client during a chat run, and
//! their JSON encoding. Key names are part of the external contract consumed
//! by the AI SDK frontend, so serialization is hand-written rather than
//! derived: the `data-<suffix>` variant carries a dynamic tag no derive can
//! express, and the exact camelCase keys must never drift.

use std::fmt::Write as _;

use rand::RngCore;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Stream id used for all text events within one request.
pub const TEXT_STREAM_ID: &str = "text-1";

/// Stream id used for all reasoning events within one request.
pub const REASONING_STREAM_ID: &str = "reasoning-1";

/// Generate a `msg-<32 hex>` message id.
pub fn generate_message_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    let mut out = String::with_capacity(4 + 32);
    out.push_str("msg-");
    for b in &bytes {
        // Writing to a String is infallible; discard the always-Ok result.
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// One event in the UI message stream.
///
/// Unknown variants are unrepresentable by construction; every variant maps
/// to exactly one `type` tag on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Emitted once at the beginning of each agent run.
    Start { message_id: String },

    TextStart { id: String },
    TextDelta { id: String, delta: String },
    TextEnd { id: String },

    ReasoningStart { id: String },
    ReasoningDelta { id: String, delta: String },
    ReasoningEnd { id: String },

    /// First time a tool call slot has both an id and a name.
    ToolInputStart {
        tool_call_id: String,
        tool_name: String,
    },
    /// One fragment of the accumulating arguments JSON.
    ToolInputDelta {
        tool_call_id: String,
        input_text_delta: String,
    },
    /// Arguments complete and parsed.
    ToolInputAvailable {
        tool_call_id: String,
        tool_name: String,
        input: Value,
    },
    /// Arguments incomplete or unparseable at end of stream; `input` carries
    /// the raw accumulated text.
    ToolInputError {
        tool_call_id: String,
        tool_name: String,
        input: Value,
        error_text: String,
    },
    ToolOutputAvailable {
        tool_call_id: String,
        output: Value,
    },
    ToolOutputError {
        tool_call_id: String,
        error_text: String,
    },

    /// A file reference surfaced by a tool output or multimodal delta.
    File { url: String, media_type: String },

    /// Agent-specific structured progress, tagged `data-<suffix>` on the wire.
    Data { suffix: String, data: Value },

    /// Terminal success event.
    Finish { finish_reason: Option<String> },

    /// Terminal failure event.
    Error { error: String },
}

impl StreamEvent {
    /// Convenience constructor for `data-<suffix>` events.
    pub fn data(suffix: impl Into<String>, data: Value) -> Self {
        Self::Data {
            suffix: suffix.into(),
            data,
        }
    }

    /// The wire `type` tag for this event.
    pub fn type_tag(&self) -> String {
        match self {
            Self::Start { .. } => "start".to_string(),
            Self::TextStart { .. } => "text-start".to_string(),
            Self::TextDelta { .. } => "text-delta".to_string(),
            Self::TextEnd { .. } => "text-end".to_string(),
            Self::ReasoningStart { .. } => "reasoning-start".to_string(),
            Self::ReasoningDelta { .. } => "reasoning-delta".to_string(),
            Self::ReasoningEnd { .. } => "reasoning-end".to_string(),
            Self::ToolInputStart { .. } => "tool-input-start".to_string(),
            Self::ToolInputDelta { .. } => "tool-input-delta".to_string(),
            Self::ToolInputAvailable { .. } => "tool-input-available".to_string(),
            Self::ToolInputError { .. } => "tool-input-error".to_string(),
            Self::ToolOutputAvailable { .. } => "tool-output-available".to_string(),
            Self::ToolOutputError { .. } => "tool-output-error".to_string(),
            Self::File { .. } => "file".to_string(),
            Self::Data { suffix, .. } => format!("data-{suffix}"),
            Self::Finish { .. } => "finish".to_string(),
            Self::Error { .. } => "error".to_string(),
        }
    }

    /// Encode the event as its wire JSON object.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Start { message_id } => json!({"type": "start", "messageId": message_id}),
            Self::TextStart { id } => json!({"type": "text-start", "id": id}),
            Self::TextDelta { id, delta } => {
                json!({"type": "text-delta", "id": id, "delta": delta})
            }
            Self::TextEnd { id } => json!({"type": "text-end", "id": id}),
            Self::ReasoningStart { id } => json!({"type": "reasoning-start", "id": id}),
            Self::ReasoningDelta { id, delta } => {
                json!({"type": "reasoning-delta", "id": id, "delta": delta})
            }
            Self::ReasoningEnd { id } => json!({"type": "reasoning-end", "id": id}),
            Self::ToolInputStart {
                tool_call_id,
                tool_name,
            } => json!({
                "type": "tool-input-start",
                "toolCallId": tool_call_id,
                "toolName": tool_name,
            }),
            Self::ToolInputDelta {
                tool_call_id,
                input_text_delta,
            } => json!({
                "type": "tool-input-delta",
                "toolCallId": tool_call_id,
                "inputTextDelta": input_text_delta,
            }),
            Self::ToolInputAvailable {
                tool_call_id,
                tool_name,
                input,
            } => json!({
                "type": "tool-input-available",
                "toolCallId": tool_call_id,
                "toolName": tool_name,
                "input": input,
            }),
            Self::ToolInputError {
                tool_call_id,
                tool_name,
                input,
                error_text,
            } => json!({
                "type": "tool-input-error",
                "toolCallId": tool_call_id,
                "toolName": tool_name,
                "input": input,
                "errorText": error_text,
            }),
            Self::ToolOutputAvailable {
                tool_call_id,
                output,
            } => json!({
                "type": "tool-output-available",
                "toolCallId": tool_call_id,
                "output": output,
            }),
            Self::ToolOutputError {
                tool_call_id,
                error_text,
            } => json!({
                "type": "tool-output-error",
                "toolCallId": tool_call_id,
                "errorText": error_text,
            }),
            Self::File { url, media_type } => {
                json!({"type": "file", "url": url, "mediaType": media_type})
            }
            Self::Data { suffix, data } => {
                json!({"type": format!("data-{suffix}"), "data": data})
            }
            Self::Finish { finish_reason } => {
                json!({"type": "finish", "finishReason": finish_reason})
            }
            Self::Error { error } => json!({"type": "error", "error": error}),
        }
    }
}

impl Serialize for StreamEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}
