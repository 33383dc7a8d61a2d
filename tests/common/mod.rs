//! Shared helpers for agent and API tests.
//!
//! Each test binary pulls in the subset it needs.
#![allow(dead_code)]

use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use chat_protocol::{
    ChatCompletionChunk, ChatCompletionRequest, Delta, FunctionDelta, StreamChoice, StreamEvent,
    ToolCallDelta,
};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use agw::{
    provider::{ChunkStream, CompletionBackend, ProviderError},
    streaming::EventSink,
    tools::{ToolError, ToolHandler},
};

/// Backend that replays one scripted chunk list per `stream_chat` call and
/// records every request it saw.
pub struct MockBackend {
    scripts: Mutex<VecDeque<Vec<Result<ChatCompletionChunk, ProviderError>>>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl MockBackend {
    pub fn new(scripts: Vec<Vec<Result<ChatCompletionChunk, ProviderError>>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    async fn stream_chat(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChunkStream, ProviderError> {
        self.requests.lock().push(request);
        let chunks = self
            .scripts
            .lock()
            .pop_front()
            .expect("no scripted response left for stream_chat call");
        Ok(Box::pin(futures::stream::iter(chunks)))
    }
}

/// Backend whose call fails outright.
pub struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn stream_chat(
        &self,
        _request: ChatCompletionRequest,
    ) -> Result<ChunkStream, ProviderError> {
        Err(ProviderError::Http("connection refused".to_string()))
    }
}

/// Tool handler returning a fixed value.
pub struct StaticTool(pub Value);

#[async_trait]
impl ToolHandler for StaticTool {
    async fn call(&self, _args: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(self.0.clone())
    }
}

pub fn text_chunk(content: &str) -> Result<ChatCompletionChunk, ProviderError> {
    Ok(ChatCompletionChunk {
        id: None,
        choices: vec![StreamChoice {
            index: 0,
            delta: Some(Delta {
                content: Some(content.to_string()),
                ..Delta::default()
            }),
            finish_reason: None,
        }],
    })
}

pub fn reasoning_chunk(content: &str) -> Result<ChatCompletionChunk, ProviderError> {
    Ok(ChatCompletionChunk {
        id: None,
        choices: vec![StreamChoice {
            index: 0,
            delta: Some(Delta {
                reasoning_content: Some(content.to_string()),
                ..Delta::default()
            }),
            finish_reason: None,
        }],
    })
}

pub fn tool_call_chunk(
    index: u32,
    id: Option<&str>,
    name: Option<&str>,
    arguments: Option<&str>,
) -> Result<ChatCompletionChunk, ProviderError> {
    Ok(ChatCompletionChunk {
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
    })
}

pub fn finish_chunk(reason: &str) -> Result<ChatCompletionChunk, ProviderError> {
    Ok(ChatCompletionChunk {
        id: None,
        choices: vec![StreamChoice {
            index: 0,
            delta: None,
            finish_reason: Some(reason.to_string()),
        }],
    })
}

/// Event channel large enough that agents in tests never block on it.
pub fn sink_and_receiver() -> (EventSink, mpsc::Receiver<StreamEvent>) {
    let (tx, rx) = mpsc::channel(1024);
    (EventSink::new(tx), rx)
}

pub async fn drain(mut rx: mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

/// The wire `type` tags of an event sequence, for order assertions.
pub fn type_tags(events: &[StreamEvent]) -> Vec<String> {
    events.iter().map(StreamEvent::type_tag).collect()
}

/// Assert the universal stream grammar: exactly one `start` first, exactly
/// one terminal (`finish` or `error`) last, and per-slot tool event order.
pub fn assert_stream_grammar(events: &[StreamEvent]) {
    let tags = type_tags(events);
    assert!(!tags.is_empty(), "stream must not be empty");
    assert_eq!(tags[0], "start", "first event must be start: {tags:?}");
    assert_eq!(
        tags.iter().filter(|t| *t == "start").count(),
        1,
        "exactly one start: {tags:?}"
    );
    let terminal_count = tags
        .iter()
        .filter(|t| *t == "finish" || *t == "error")
        .count();
    assert_eq!(terminal_count, 1, "exactly one terminal event: {tags:?}");
    let last = tags.last().unwrap();
    assert!(
        last == "finish" || last == "error",
        "terminal event must be last: {tags:?}"
    );

    // Per tool-call slot: one input-start, deltas, one input resolution,
    // one output resolution, in that order.
    let mut slot_ids: Vec<String> = Vec::new();
    for event in events {
        if let StreamEvent::ToolInputStart { tool_call_id, .. } = event {
            slot_ids.push(tool_call_id.clone());
        }
    }
    for id in slot_ids {
        let slot_events: Vec<&str> = events
            .iter()
            .filter_map(|event| match event {
                StreamEvent::ToolInputStart { tool_call_id, .. } if tool_call_id == &id => {
                    Some("input-start")
                }
                StreamEvent::ToolInputDelta { tool_call_id, .. } if tool_call_id == &id => {
                    Some("input-delta")
                }
                StreamEvent::ToolInputAvailable { tool_call_id, .. } if tool_call_id == &id => {
                    Some("input-available")
                }
                StreamEvent::ToolInputError { tool_call_id, .. } if tool_call_id == &id => {
                    Some("input-error")
                }
                StreamEvent::ToolOutputAvailable { tool_call_id, .. } if tool_call_id == &id => {
                    Some("output-available")
                }
                StreamEvent::ToolOutputError { tool_call_id, .. } if tool_call_id == &id => {
                    Some("output-error")
                }
                _ => None,
            })
            .collect();

        assert_eq!(slot_events[0], "input-start", "slot {id}: {slot_events:?}");
        assert_eq!(
            slot_events
                .iter()
                .filter(|e| **e == "input-start")
                .count(),
            1,
            "slot {id}: {slot_events:?}"
        );
        let input_resolutions = slot_events
            .iter()
            .filter(|e| **e == "input-available" || **e == "input-error")
            .count();
        assert_eq!(input_resolutions, 1, "slot {id}: {slot_events:?}");
        let output_resolutions = slot_events
            .iter()
            .filter(|e| **e == "output-available" || **e == "output-error")
            .count();
        assert_eq!(output_resolutions, 1, "slot {id}: {slot_events:?}");
        // No input events after the input resolution.
        let resolution_pos = slot_events
            .iter()
            .position(|e| *e == "input-available" || *e == "input-error")
            .unwrap();
        assert!(
            slot_events[resolution_pos + 1..]
                .iter()
                .all(|e| *e == "output-available" || *e == "output-error"),
            "slot {id}: {slot_events:?}"
        );
    }
}
