//! Per-turn stream state.

use std::collections::BTreeMap;

/// Conversation-flow state machine for one agent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Initial,
    Streaming,
    ProcessingTools,
    Finished,
    Error,
}

/// Accumulating state of one tool-call slot within a turn.
///
/// Once `started` is set, both `id` and `name` are present and a
/// `tool-input-start` event has been emitted for the slot.
#[derive(Debug, Clone, Default)]
pub struct ToolCallState {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
    pub started: bool,
}

/// State for one provider turn, created fresh each loop iteration.
///
/// Tool slots are keyed by the provider-assigned index; the ordered map
/// makes finalization run in ascending slot order.
#[derive(Debug, Clone, Default)]
pub struct StreamStateData {
    pub text_started: bool,
    pub reasoning_started: bool,
    pub finish_reason: Option<String>,
    /// Text accumulated this turn, shipped back to the provider alongside
    /// the turn's tool calls.
    pub current_text_content: String,
    pub tool_calls_state: BTreeMap<u32, ToolCallState>,
}
