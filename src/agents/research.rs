//! The research agent.
//!
//! Scripted progress flow: a start label, three to six search rounds of
//! `data-step` events, a summarizing status, an end label, then one plain
//! text stream from the provider. No tools, no reasoning hint.

use std::{sync::Arc, time::Duration};

use chat_protocol::{
    generate_message_id, ChatCompletionRequest, ClientMessage, StreamEvent, TEXT_STREAM_ID,
};
use futures::StreamExt;
use rand::{seq::IndexedRandom, Rng};
use serde_json::json;
use tracing::{debug, error};

use super::AgentError;
use crate::{
    catalog::ModelCard,
    provider::{adapter::to_chat_messages, CompletionBackend},
    streaming::{ChunkProcessor, EventSink, StreamStateData},
};

const SAMPLE_DOMAINS: [&str; 10] = [
    "example.com",
    "wikipedia.org",
    "github.com",
    "stackoverflow.com",
    "arxiv.org",
    "nature.com",
    "pubmed.ncbi.nlm.nih.gov",
    "scholar.google.com",
    "medium.com",
    "substack.com",
];

const SAMPLE_LABELS: [&str; 7] = [
    "Looking up on the web...",
    "Digging deeper...",
    "I'm not sure if this is a good idea, but I'm gonna do it anyway...",
    "Brainstorming...",
    "Lemme look up some memes while I'm at it...",
    "Doing some research...",
    "I'm really not sure about this one...",
];

pub struct ResearchAgent {
    backend: Arc<dyn CompletionBackend>,
    model: ModelCard,
}

impl ResearchAgent {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: ModelCard) -> Self {
        Self { backend, model }
    }

    pub async fn run(self, messages: Vec<ClientMessage>, sink: EventSink) {
        match self.execute(messages, &sink).await {
            Ok(()) => {}
            Err(AgentError::Disconnected) => {
                debug!("research agent stopped: client disconnected");
            }
            Err(err) => {
                error!("research agent failed: {}", err);
                let _ = sink
                    .send(StreamEvent::Error {
                        error: err.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        messages: Vec<ClientMessage>,
        sink: &EventSink,
    ) -> Result<(), AgentError> {
        let chat_messages = to_chat_messages(&messages);

        sink.send(StreamEvent::Start {
            message_id: generate_message_id(),
        })
        .await?;

        sink.send(StreamEvent::data(
            "start-label",
            json!({"label": "Researching..."}),
        ))
        .await?;

        let rounds = rand::rng().random_range(3..=6);
        for _ in 0..rounds {
            // The rng is not held across awaits; it is not Send.
            let (label, details, delay_ms) = {
                let mut rng = rand::rng();
                let count = rng.random_range(2..=8usize);
                let details: Vec<String> = SAMPLE_DOMAINS[..]
                    .choose_multiple(&mut rng, count.min(SAMPLE_DOMAINS.len()))
                    .map(|domain| format!("www.{domain}"))
                    .collect();
                let label = SAMPLE_LABELS[rng.random_range(0..SAMPLE_LABELS.len())];
                let delay_ms = rng.random_range(500..=2000u64);
                (label, details, delay_ms)
            };

            sink.send(StreamEvent::data(
                "step",
                json!({"label": label, "details": details, "type": "search"}),
            ))
            .await?;
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        sink.send(StreamEvent::data(
            "step",
            json!({"label": "Summarizing the information...", "type": "status"}),
        ))
        .await?;
        tokio::time::sleep(Duration::from_millis(300)).await;

        sink.send(StreamEvent::data(
            "end-label",
            json!({"label": "Research completed. Here is my conclusion:"}),
        ))
        .await?;

        let request = ChatCompletionRequest {
            model: self.model.id.clone(),
            messages: chat_messages,
            stream: true,
            tools: None,
            reasoning_effort: None,
        };
        let mut state = StreamStateData::default();
        let mut stream = self.backend.stream_chat(request).await?;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            sink.send_all(ChunkProcessor::process_text_chunk(&chunk, &mut state))
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
        Ok(())
    }
}
