//! Protocol definitions for the streaming-chat gateway.
//!
//! Three wire surfaces live here:
//! - [`ui`] — the client-facing UI message shape (`ClientMessage` and parts)
//! - [`events`] — the server-sent UI event stream emitted back to the client
//! - [`chat`] — the OpenAI-compatible chat-completions shapes spoken upstream

pub mod chat;
pub mod events;
pub mod ui;

pub use chat::{
    ChatCompletionChunk, ChatCompletionRequest, ChatMessage, ContentPart, Delta, FunctionCall,
    FunctionDelta, ImageUrl, MessageContent, ReasoningEffort, StreamChoice, ToolCall,
    ToolCallDelta, ToolDefinition,
};
pub use events::{generate_message_id, StreamEvent, REASONING_STREAM_ID, TEXT_STREAM_ID};
pub use ui::{ClientMessage, MessagePart, Role};
