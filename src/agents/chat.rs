//! The multi-round chat agent.
//!
//! Streams provider turns through the chunk processor, executes any tool
//! calls the turn accumulated, feeds the results back, and repeats until the
//! model stops calling tools. Conversation flow:
//!
//! Initial -> Streaming <-> ProcessingTools -> Finished, any state -> Error.

use std::sync::Arc;

use chat_protocol::{
    generate_message_id, ChatCompletionRequest, ChatMessage, ClientMessage, ReasoningEffort,
    StreamEvent, REASONING_STREAM_ID, TEXT_STREAM_ID,
};
use futures::StreamExt;
use tracing::{debug, error};

use super::AgentError;
use crate::{
    catalog::ModelCard,
    provider::{adapter::to_chat_messages, CompletionBackend},
    streaming::{ChunkProcessor, EventSink, StreamState, StreamStateData},
    tools::ToolSet,
};

pub struct ChatAgent {
    backend: Arc<dyn CompletionBackend>,
    model: ModelCard,
    tools: ToolSet,
}

impl ChatAgent {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: ModelCard, tools: ToolSet) -> Self {
        Self {
            backend,
            model,
            tools,
        }
    }

    /// Reasoning-effort hint for the model: `"low"` when the model supports
    /// a reasoning channel, with a detailed summary for the responses-style
    /// variant, unset otherwise.
    pub fn reasoning_effort(model: &ModelCard) -> Option<ReasoningEffort> {
        if !model.supports_reasoning {
            return None;
        }
        if model.id.contains("/responses/") {
            Some(ReasoningEffort::low_with_detailed_summary())
        } else {
            Some(ReasoningEffort::low())
        }
    }

    /// Run the agent to completion, emitting events into `sink`.
    pub async fn run(self, messages: Vec<ClientMessage>, sink: EventSink) {
        match self.execute(messages, &sink).await {
            Ok(()) => {}
            Err(AgentError::Disconnected) => {
                debug!("chat agent stopped: client disconnected");
            }
            Err(err) => {
                error!("chat agent failed: {}", err);
                // Best effort; the client may already be gone.
                let _ = sink
                    .send(StreamEvent::Error {
                        error: err.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn execute(&self, messages: Vec<ClientMessage>, sink: &EventSink) -> Result<(), AgentError> {
        let mut chat_messages = to_chat_messages(&messages);
        let tool_definitions = self.tools.definitions_option();
        let reasoning_effort = Self::reasoning_effort(&self.model);

        sink.send(StreamEvent::Start {
            message_id: generate_message_id(),
        })
        .await?;
        let mut machine = StreamState::Streaming;

        while machine == StreamState::Streaming {
            let mut state = StreamStateData::default();
            let request = ChatCompletionRequest {
                model: self.model.id.clone(),
                messages: chat_messages.clone(),
                stream: true,
                tools: tool_definitions.clone(),
                reasoning_effort: reasoning_effort.clone(),
            };

            let mut stream = self.backend.stream_chat(request).await?;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                sink.send_all(ChunkProcessor::process_chunk(&chunk, &mut state))
                    .await?;
            }

            if state.tool_calls_state.is_empty() {
                transition(&mut machine, StreamState::Finished);
                if state.reasoning_started {
                    sink.send(StreamEvent::ReasoningEnd {
                        id: REASONING_STREAM_ID.to_string(),
                    })
                    .await?;
                }
                if state.text_started {
                    sink.send(StreamEvent::TextEnd {
                        id: TEXT_STREAM_ID.to_string(),
                    })
                    .await?;
                }
                sink.send(StreamEvent::Finish {
                    finish_reason: state.finish_reason.clone(),
                })
                .await?;
                break;
            }

            transition(&mut machine, StreamState::ProcessingTools);
            let (assistant_calls, tool_messages) =
                ChunkProcessor::run_tool_calls(&state, &self.tools, sink).await?;

            let text = (!state.current_text_content.is_empty())
                .then(|| state.current_text_content.clone());
            chat_messages.push(ChatMessage::assistant_tool_calls(text, assistant_calls));
            chat_messages.extend(tool_messages);

            transition(&mut machine, StreamState::Streaming);
        }

        Ok(())
    }
}

fn transition(machine: &mut StreamState, next: StreamState) {
    debug!("stream state {:?} -> {:?}", machine, next);
    *machine = next;
}
