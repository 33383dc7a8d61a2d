//! Stream state, chunk processing, and SSE framing.

pub mod processor;
pub mod sse;
pub mod state;

use chat_protocol::StreamEvent;
use tokio::sync::mpsc;

pub use processor::ChunkProcessor;
pub use state::{StreamState, StreamStateData, ToolCallState};

/// The receiving half of the event channel went away: the client
/// disconnected or the request was cancelled. Not an error to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkClosed;

/// Sender half of the per-request event channel.
///
/// Each send is a suspension point: the channel is bounded, so a slow client
/// back-pressures the agent through the HTTP writer.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<StreamEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::Sender<StreamEvent>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, event: StreamEvent) -> Result<(), SinkClosed> {
        self.tx.send(event).await.map_err(|_| SinkClosed)
    }

    pub async fn send_all(
        &self,
        events: impl IntoIterator<Item = StreamEvent>,
    ) -> Result<(), SinkClosed> {
        for event in events {
            self.send(event).await?;
        }
        Ok(())
    }
}
