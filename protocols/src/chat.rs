//! OpenAI-compatible chat-completions wire shapes.
//!
//! Only the subset this gateway speaks: streaming requests with function
//! tools, and the delta chunks coming back. Provider-specific extras stay out
//! of these types; the chunk processor absorbs shape differences.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Request types
// ============================================================================

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Provider-side model name (no gateway prefix).
    pub model: String,

    pub messages: Vec<ChatMessage>,

    #[serde(default)]
    pub stream: bool,

    /// Function-calling tool definitions, omitted when empty.
    pub tools: Option<Vec<ToolDefinition>>,

    /// Reasoning-effort hint for models that support a reasoning channel.
    pub reasoning_effort: Option<ReasoningEffort>,
}

/// One message in the provider conversation.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", "assistant" or "tool".
    pub role: String,

    pub content: Option<MessageContent>,

    /// Tool invocations on assistant turns.
    pub tool_calls: Option<Vec<ToolCall>>,

    /// Set on tool-result turns, together with `name`.
    pub tool_call_id: Option<String>,

    pub name: Option<String>,
}

impl ChatMessage {
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    /// Assistant turn carrying the partial text (if any) and its tool calls.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.map(MessageContent::Text),
            tool_calls: Some(tool_calls),
            tool_call_id: None,
            name: None,
        }
    }

    /// Tool-result turn answering `tool_call_id`.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(MessageContent::Text(content.into())),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
        }
    }
}

/// String content or an array of typed parts for multimodal providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// A completed tool call as echoed back to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: String) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as the raw JSON text the model produced.
    pub arguments: String,
}

/// OpenAI function-calling tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionSpec,
}

impl ToolDefinition {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// Always an `object` schema with `properties` and `required`.
    pub parameters: Value,
}

/// Reasoning-effort hint; either a bare level or a level with a summary mode
/// for responses-style models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReasoningEffort {
    Level(String),
    WithSummary { effort: String, summary: String },
}

impl ReasoningEffort {
    pub fn low() -> Self {
        Self::Level("low".to_string())
    }

    pub fn low_with_detailed_summary() -> Self {
        Self::WithSummary {
            effort: "low".to_string(),
            summary: "detailed".to_string(),
        }
    }
}

// ============================================================================
// Streaming response types
// ============================================================================

/// One streamed chunk of a chat completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Option<Delta>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content for one choice.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,

    pub content: Option<String>,

    /// Secondary chain-of-thought channel emitted by reasoning models.
    pub reasoning_content: Option<String>,

    /// Multimodal part array; items are provider-shaped and inspected loosely.
    pub content_parts: Option<Vec<Value>>,

    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// Fragment of a tool call, keyed by the provider-assigned slot index.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    pub id: Option<String>,
    pub function: Option<FunctionDelta>,
}

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDelta {
    pub name: Option<String>,
    pub arguments: Option<String>,
}
