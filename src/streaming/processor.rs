//! Provider-delta to UI-event transformation.
//!
//! The processor is the only place that looks inside provider chunks; the
//! agents drive it and forward whatever events it yields. It also finalizes
//! a turn's accumulated tool calls: parsing arguments, dispatching handlers,
//! and building the messages that continue the conversation.

use chat_protocol::{
    ChatCompletionChunk, ChatMessage, Delta, StreamEvent, ToolCall, ToolCallDelta,
    REASONING_STREAM_ID, TEXT_STREAM_ID,
};
use serde_json::{json, Map, Value};
use tracing::warn;

use super::{
    state::{StreamStateData, ToolCallState},
    EventSink, SinkClosed,
};
use crate::tools::ToolSet;

/// Output payload fed back to the model when arguments do not parse.
const PARSE_FAILURE_OUTPUT: &str = "Failed to parse arguments";

pub struct ChunkProcessor;

impl ChunkProcessor {
    /// Transform one provider chunk into UI events, updating the turn state.
    ///
    /// Only the first choice is consulted; this gateway never requests
    /// multiple completions.
    pub fn process_chunk(
        chunk: &ChatCompletionChunk,
        state: &mut StreamStateData,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let Some(choice) = chunk.choices.first() else {
            return events;
        };

        if let Some(reason) = &choice.finish_reason {
            state.finish_reason = Some(reason.clone());
        }
        let Some(delta) = &choice.delta else {
            return events;
        };

        Self::process_reasoning(delta, state, &mut events);
        Self::process_text(delta, state, &mut events);
        Self::process_content_parts(delta, &mut events);
        if let Some(tool_calls) = &delta.tool_calls {
            for call in tool_calls {
                Self::process_tool_call_delta(call, state, &mut events);
            }
        }
        events
    }

    /// Text-only variant used by the research agent: reasoning, files, and
    /// tool calls in the delta are ignored.
    pub fn process_text_chunk(
        chunk: &ChatCompletionChunk,
        state: &mut StreamStateData,
    ) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let Some(choice) = chunk.choices.first() else {
            return events;
        };
        if let Some(reason) = &choice.finish_reason {
            state.finish_reason = Some(reason.clone());
        }
        if let Some(delta) = &choice.delta {
            Self::process_text(delta, state, &mut events);
        }
        events
    }

    fn process_reasoning(delta: &Delta, state: &mut StreamStateData, events: &mut Vec<StreamEvent>) {
        let Some(reasoning) = &delta.reasoning_content else {
            return;
        };
        if !state.reasoning_started {
            events.push(StreamEvent::ReasoningStart {
                id: REASONING_STREAM_ID.to_string(),
            });
            state.reasoning_started = true;
        }
        events.push(StreamEvent::ReasoningDelta {
            id: REASONING_STREAM_ID.to_string(),
            delta: reasoning.clone(),
        });
    }

    fn process_text(delta: &Delta, state: &mut StreamStateData, events: &mut Vec<StreamEvent>) {
        let Some(content) = &delta.content else {
            return;
        };
        state.current_text_content.push_str(content);
        if !state.text_started {
            events.push(StreamEvent::TextStart {
                id: TEXT_STREAM_ID.to_string(),
            });
            state.text_started = true;
        }
        events.push(StreamEvent::TextDelta {
            id: TEXT_STREAM_ID.to_string(),
            delta: content.clone(),
        });
    }

    /// Multimodal `content_parts` arrays: emit a `file` event per image item.
    fn process_content_parts(delta: &Delta, events: &mut Vec<StreamEvent>) {
        let Some(parts) = &delta.content_parts else {
            return;
        };
        for part in parts {
            if part.get("type").and_then(Value::as_str) != Some("image_url") {
                continue;
            }
            let url = part
                .get("image_url")
                .and_then(|item| item.get("url"))
                .and_then(Value::as_str);
            if let Some(url) = url {
                events.push(StreamEvent::File {
                    url: url.to_string(),
                    media_type: Self::media_type_for_url(url).to_string(),
                });
            }
        }
    }

    /// Media type inferred from the URL; PNG when nothing matches.
    pub fn media_type_for_url(url: &str) -> &'static str {
        if url.contains(".jpg") || url.contains(".jpeg") {
            "image/jpeg"
        } else if url.contains(".gif") {
            "image/gif"
        } else if url.contains(".webp") {
            "image/webp"
        } else {
            "image/png"
        }
    }

    /// Accumulate one tool-call fragment into its slot.
    ///
    /// `tool-input-start` fires exactly once per slot, the first time both
    /// the id and the name are known; argument fragments after that point
    /// surface as `tool-input-delta`.
    fn process_tool_call_delta(
        call: &ToolCallDelta,
        state: &mut StreamStateData,
        events: &mut Vec<StreamEvent>,
    ) {
        let slot = state.tool_calls_state.entry(call.index).or_default();

        if let Some(id) = &call.id {
            slot.id = Some(id.clone());
        }
        let mut arguments_fragment = None;
        if let Some(function) = &call.function {
            if let Some(name) = &function.name {
                slot.name = Some(name.clone());
            }
            if let Some(arguments) = &function.arguments {
                slot.arguments.push_str(arguments);
                arguments_fragment = Some(arguments.clone());
            }
        }

        if !slot.started {
            if let (Some(id), Some(name)) = (&slot.id, &slot.name) {
                events.push(StreamEvent::ToolInputStart {
                    tool_call_id: id.clone(),
                    tool_name: name.clone(),
                });
                slot.started = true;
            }
        }

        if slot.started {
            if let (Some(id), Some(fragment)) = (&slot.id, arguments_fragment) {
                events.push(StreamEvent::ToolInputDelta {
                    tool_call_id: id.clone(),
                    input_text_delta: fragment,
                });
            }
        }
    }

    /// Finalize the turn's tool calls in ascending slot order.
    ///
    /// For each completed slot: parse the arguments, emit the input event,
    /// run the handler, emit the output event, and collect the assistant
    /// tool-call entry plus the tool-result message that continue the
    /// conversation. Local failures are fed back to the model; only a closed
    /// sink aborts.
    pub async fn run_tool_calls(
        state: &StreamStateData,
        tools: &ToolSet,
        sink: &EventSink,
    ) -> Result<(Vec<ToolCall>, Vec<ChatMessage>), SinkClosed> {
        let mut assistant_calls = Vec::new();
        let mut tool_messages = Vec::new();

        for slot in state.tool_calls_state.values() {
            let Some(outcome) = Self::run_tool_call(slot, tools, sink).await? else {
                continue;
            };
            assistant_calls.push(outcome.call);
            tool_messages.push(outcome.result_message);
        }

        Ok((assistant_calls, tool_messages))
    }

    async fn run_tool_call(
        slot: &ToolCallState,
        tools: &ToolSet,
        sink: &EventSink,
    ) -> Result<Option<ToolCallOutcome>, SinkClosed> {
        let (Some(tool_call_id), Some(tool_name)) = (&slot.id, &slot.name) else {
            // The provider never completed this slot; there is nothing to
            // execute and no started input stream to terminate.
            warn!("dropping tool-call slot without id and name");
            return Ok(None);
        };

        let call = ToolCall::function(tool_call_id, tool_name, slot.arguments.clone());

        let arguments: Map<String, Value> = match serde_json::from_str(&slot.arguments) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Self::parse_failure(slot, call, format!("expected object, got {other}"), sink)
                    .await
                    .map(Some);
            }
            Err(err) => {
                return Self::parse_failure(slot, call, err.to_string(), sink)
                    .await
                    .map(Some);
            }
        };

        sink.send(StreamEvent::ToolInputAvailable {
            tool_call_id: tool_call_id.clone(),
            tool_name: tool_name.clone(),
            input: Value::Object(arguments.clone()),
        })
        .await?;

        let result_content = match tools.handler(tool_name) {
            Some(handler) => match handler.call(arguments).await {
                Ok(output) => {
                    sink.send(StreamEvent::ToolOutputAvailable {
                        tool_call_id: tool_call_id.clone(),
                        output: output.clone(),
                    })
                    .await?;
                    if let Some(file_event) = Self::file_event_for_output(&output) {
                        sink.send(file_event).await?;
                    }
                    match output {
                        Value::String(text) => text,
                        other => other.to_string(),
                    }
                }
                Err(err) => {
                    sink.send(StreamEvent::ToolOutputError {
                        tool_call_id: tool_call_id.clone(),
                        error_text: err.to_string(),
                    })
                    .await?;
                    err.to_string()
                }
            },
            None => {
                let message = format!("Tool {tool_name} not found");
                sink.send(StreamEvent::ToolOutputError {
                    tool_call_id: tool_call_id.clone(),
                    error_text: message.clone(),
                })
                .await?;
                message
            }
        };

        Ok(Some(ToolCallOutcome {
            result_message: ChatMessage::tool_result(tool_call_id, tool_name, result_content),
            call,
        }))
    }

    /// Arguments were incomplete or unparseable at end of stream.
    async fn parse_failure(
        slot: &ToolCallState,
        call: ToolCall,
        parse_error: String,
        sink: &EventSink,
    ) -> Result<ToolCallOutcome, SinkClosed> {
        let tool_call_id = call.id.clone();
        let tool_name = call.function.name.clone();

        sink.send(StreamEvent::ToolInputError {
            tool_call_id: tool_call_id.clone(),
            tool_name: tool_name.clone(),
            input: Value::String(slot.arguments.clone()),
            error_text: parse_error,
        })
        .await?;

        let output = json!({"error": PARSE_FAILURE_OUTPUT});
        sink.send(StreamEvent::ToolOutputAvailable {
            tool_call_id: tool_call_id.clone(),
            output: output.clone(),
        })
        .await?;

        Ok(ToolCallOutcome {
            result_message: ChatMessage::tool_result(tool_call_id, tool_name, output.to_string()),
            call,
        })
    }

    /// A tool output referencing a file also surfaces as a `file` event.
    fn file_event_for_output(output: &Value) -> Option<StreamEvent> {
        let url = output.get("url")?.as_str()?;
        let media_type = output
            .get("mediaType")
            .or_else(|| output.get("media_type"))?
            .as_str()?;
        Some(StreamEvent::File {
            url: url.to_string(),
            media_type: media_type.to_string(),
        })
    }
}

struct ToolCallOutcome {
    call: ToolCall,
    result_message: ChatMessage,
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use chat_protocol::{FunctionDelta, MessageContent, StreamChoice, ToolDefinition};
    use tokio::sync::mpsc;

    use super::*;
    use crate::tools::{ToolError, ToolHandler};

    fn text_chunk(content: &str) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: Some(Delta {
                    content: Some(content.to_string()),
                    ..Delta::default()
                }),
                finish_reason: None,
            }],
        }
    }

    fn reasoning_chunk(content: &str) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: Some(Delta {
                    reasoning_content: Some(content.to_string()),
                    ..Delta::default()
                }),
                finish_reason: None,
            }],
        }
    }

    fn tool_chunk(
        index: u32,
        id: Option<&str>,
        name: Option<&str>,
        arguments: Option<&str>,
    ) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: Some(Delta {
                    tool_calls: Some(vec![ToolCallDelta {
                        index,
                        id: id.map(str::to_string),
                        function: Some(FunctionDelta {
                            name: name.map(str::to_string),
                            arguments: arguments.map(str::to_string),
                        }),
                    }]),
                    ..Delta::default()
                }),
                finish_reason: None,
            }],
        }
    }

    fn finish_chunk(reason: &str) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: None,
                finish_reason: Some(reason.to_string()),
            }],
        }
    }

    struct StaticTool(Value);

    #[async_trait]
    impl ToolHandler for StaticTool {
        async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
            Ok(self.0.clone())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl ToolHandler for FailingTool {
        async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
            Err(ToolError("backend exploded".to_string()))
        }
    }

    fn tool_set_with(name: &str, handler: Arc<dyn ToolHandler>) -> ToolSet {
        let mut tools = ToolSet::new();
        tools.register(
            ToolDefinition::function(name, "test tool", json!({"type": "object"})),
            handler,
        );
        tools
    }

    async fn collect_tool_events(
        state: &StreamStateData,
        tools: &ToolSet,
    ) -> (Vec<StreamEvent>, Vec<ToolCall>, Vec<ChatMessage>) {
        let (tx, mut rx) = mpsc::channel(64);
        let sink = EventSink::new(tx);
        let (calls, messages) = ChunkProcessor::run_tool_calls(state, tools, &sink)
            .await
            .unwrap();
        drop(sink);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (events, calls, messages)
    }

    fn slot_state(id: Option<&str>, name: Option<&str>, arguments: &str) -> StreamStateData {
        let mut state = StreamStateData::default();
        state.tool_calls_state.insert(
            0,
            ToolCallState {
                id: id.map(str::to_string),
                name: name.map(str::to_string),
                arguments: arguments.to_string(),
                started: id.is_some() && name.is_some(),
            },
        );
        state
    }

    #[test]
    fn test_text_start_emitted_once() {
        let mut state = StreamStateData::default();
        let first = ChunkProcessor::process_chunk(&text_chunk("He"), &mut state);
        let second = ChunkProcessor::process_chunk(&text_chunk("llo"), &mut state);

        assert_eq!(
            first,
            vec![
                StreamEvent::TextStart {
                    id: "text-1".to_string()
                },
                StreamEvent::TextDelta {
                    id: "text-1".to_string(),
                    delta: "He".to_string()
                },
            ]
        );
        assert_eq!(
            second,
            vec![StreamEvent::TextDelta {
                id: "text-1".to_string(),
                delta: "llo".to_string()
            }]
        );
        assert_eq!(state.current_text_content, "Hello");
    }

    #[test]
    fn test_reasoning_stream_events() {
        let mut state = StreamStateData::default();
        let events = ChunkProcessor::process_chunk(&reasoning_chunk("thinking"), &mut state);
        assert_eq!(
            events,
            vec![
                StreamEvent::ReasoningStart {
                    id: "reasoning-1".to_string()
                },
                StreamEvent::ReasoningDelta {
                    id: "reasoning-1".to_string(),
                    delta: "thinking".to_string()
                },
            ]
        );
        assert!(state.reasoning_started);
        assert!(!state.text_started);
    }

    #[test]
    fn test_finish_reason_recorded() {
        let mut state = StreamStateData::default();
        let events = ChunkProcessor::process_chunk(&finish_chunk("stop"), &mut state);
        assert!(events.is_empty());
        assert_eq!(state.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_tool_input_start_waits_for_id_and_name() {
        let mut state = StreamStateData::default();

        // Fragment with only an id: nothing observable yet.
        let events =
            ChunkProcessor::process_chunk(&tool_chunk(0, Some("c1"), None, None), &mut state);
        assert!(events.is_empty());

        // Name arrives with the first argument fragment.
        let events = ChunkProcessor::process_chunk(
            &tool_chunk(0, None, Some("get_current_weather"), Some("{\"lat")),
            &mut state,
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolInputStart {
                    tool_call_id: "c1".to_string(),
                    tool_name: "get_current_weather".to_string()
                },
                StreamEvent::ToolInputDelta {
                    tool_call_id: "c1".to_string(),
                    input_text_delta: "{\"lat".to_string()
                },
            ]
        );

        // Further fragments only produce deltas.
        let events = ChunkProcessor::process_chunk(
            &tool_chunk(0, None, None, Some("itude\":1}")),
            &mut state,
        );
        assert_eq!(events.len(), 1);
        assert_eq!(state.tool_calls_state[&0].arguments, "{\"latitude\":1}");
    }

    #[test]
    fn test_interleaved_slots_accumulate_independently() {
        let mut state = StreamStateData::default();
        ChunkProcessor::process_chunk(&tool_chunk(0, Some("c1"), Some("a"), Some("{\"x\"")), &mut state);
        ChunkProcessor::process_chunk(&tool_chunk(1, Some("c2"), Some("b"), Some("{\"y\"")), &mut state);
        ChunkProcessor::process_chunk(&tool_chunk(0, None, None, Some(":1}")), &mut state);
        ChunkProcessor::process_chunk(&tool_chunk(1, None, None, Some(":2}")), &mut state);

        assert_eq!(state.tool_calls_state[&0].arguments, "{\"x\":1}");
        assert_eq!(state.tool_calls_state[&1].arguments, "{\"y\":2}");
    }

    #[test]
    fn test_content_parts_emit_file_events() {
        let mut state = StreamStateData::default();
        let chunk = ChatCompletionChunk {
            id: None,
            choices: vec![StreamChoice {
                index: 0,
                delta: Some(Delta {
                    content_parts: Some(vec![
                        json!({"type": "image_url", "image_url": {"url": "https://x/pic.webp"}}),
                        json!({"type": "text", "text": "ignored"}),
                        json!({"type": "image_url", "image_url": {"url": "https://x/photo.jpg"}}),
                    ]),
                    ..Delta::default()
                }),
                finish_reason: None,
            }],
        };
        let events = ChunkProcessor::process_chunk(&chunk, &mut state);
        assert_eq!(
            events,
            vec![
                StreamEvent::File {
                    url: "https://x/pic.webp".to_string(),
                    media_type: "image/webp".to_string()
                },
                StreamEvent::File {
                    url: "https://x/photo.jpg".to_string(),
                    media_type: "image/jpeg".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_media_type_inference() {
        assert_eq!(ChunkProcessor::media_type_for_url("a/b.jpeg"), "image/jpeg");
        assert_eq!(ChunkProcessor::media_type_for_url("a/b.jpg?x=1"), "image/jpeg");
        assert_eq!(ChunkProcessor::media_type_for_url("a/b.gif"), "image/gif");
        assert_eq!(ChunkProcessor::media_type_for_url("a/b.webp"), "image/webp");
        assert_eq!(ChunkProcessor::media_type_for_url("a/b.png"), "image/png");
        assert_eq!(ChunkProcessor::media_type_for_url("a/b"), "image/png");
    }

    #[tokio::test]
    async fn test_run_tool_calls_success() {
        let state = slot_state(Some("c1"), Some("echo"), r#"{"x":1}"#);
        let tools = tool_set_with("echo", Arc::new(StaticTool(json!("hi"))));

        let (events, calls, messages) = collect_tool_events(&state, &tools).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolInputAvailable {
                    tool_call_id: "c1".to_string(),
                    tool_name: "echo".to_string(),
                    input: json!({"x": 1}),
                },
                StreamEvent::ToolOutputAvailable {
                    tool_call_id: "c1".to_string(),
                    output: json!("hi"),
                },
            ]
        );
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].function.arguments, r#"{"x":1}"#);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, "tool");
        assert!(matches!(
            messages[0].content,
            Some(MessageContent::Text(ref text)) if text == "hi"
        ));
    }

    #[tokio::test]
    async fn test_run_tool_calls_structured_output_serialized_for_model() {
        let state = slot_state(Some("c1"), Some("weather"), r#"{}"#);
        let tools = tool_set_with(
            "weather",
            Arc::new(StaticTool(json!({"current": {"temperature_2m": 10}}))),
        );

        let (_events, _calls, messages) = collect_tool_events(&state, &tools).await;
        assert!(matches!(
            messages[0].content,
            Some(MessageContent::Text(ref text)) if text == r#"{"current":{"temperature_2m":10}}"#
        ));
    }

    #[tokio::test]
    async fn test_run_tool_calls_parse_failure() {
        let state = slot_state(Some("c1"), Some("weather"), "{latitude:");
        let tools = tool_set_with("weather", Arc::new(StaticTool(json!("unused"))));

        let (events, calls, messages) = collect_tool_events(&state, &tools).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[0],
            StreamEvent::ToolInputError { tool_call_id, input, .. }
                if tool_call_id == "c1" && input == &json!("{latitude:")
        ));
        assert_eq!(
            events[1],
            StreamEvent::ToolOutputAvailable {
                tool_call_id: "c1".to_string(),
                output: json!({"error": "Failed to parse arguments"}),
            }
        );
        // The failure is surfaced to the model so the loop can continue.
        assert_eq!(calls.len(), 1);
        assert!(matches!(
            messages[0].content,
            Some(MessageContent::Text(ref text)) if text.contains("Failed to parse arguments")
        ));
    }

    #[tokio::test]
    async fn test_run_tool_calls_unknown_tool() {
        let state = slot_state(Some("c1"), Some("nope"), "{}");
        let tools = ToolSet::new();

        let (events, _calls, messages) = collect_tool_events(&state, &tools).await;
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[1],
            StreamEvent::ToolOutputError {
                tool_call_id: "c1".to_string(),
                error_text: "Tool nope not found".to_string(),
            }
        );
        assert!(matches!(
            messages[0].content,
            Some(MessageContent::Text(ref text)) if text == "Tool nope not found"
        ));
    }

    #[tokio::test]
    async fn test_run_tool_calls_handler_error() {
        let state = slot_state(Some("c1"), Some("boom"), "{}");
        let tools = tool_set_with("boom", Arc::new(FailingTool));

        let (events, _calls, messages) = collect_tool_events(&state, &tools).await;
        assert_eq!(
            events[1],
            StreamEvent::ToolOutputError {
                tool_call_id: "c1".to_string(),
                error_text: "backend exploded".to_string(),
            }
        );
        assert!(matches!(
            messages[0].content,
            Some(MessageContent::Text(ref text)) if text == "backend exploded"
        ));
    }

    #[tokio::test]
    async fn test_run_tool_calls_skips_incomplete_slot() {
        let state = slot_state(Some("c1"), None, "{}");
        let tools = ToolSet::new();

        let (events, calls, messages) = collect_tool_events(&state, &tools).await;
        assert!(events.is_empty());
        assert!(calls.is_empty());
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_run_tool_calls_file_output_emits_file_event() {
        let state = slot_state(Some("c1"), Some("paint"), "{}");
        let tools = tool_set_with(
            "paint",
            Arc::new(StaticTool(
                json!({"url": "https://x/out.png", "mediaType": "image/png"}),
            )),
        );

        let (events, _calls, _messages) = collect_tool_events(&state, &tools).await;
        assert_eq!(
            events[2],
            StreamEvent::File {
                url: "https://x/out.png".to_string(),
                media_type: "image/png".to_string(),
            }
        );
    }
}
