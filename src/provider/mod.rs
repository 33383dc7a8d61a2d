//! Upstream model providers.

pub mod adapter;
pub mod client;

use std::pin::Pin;

use async_trait::async_trait;
use chat_protocol::{ChatCompletionChunk, ChatCompletionRequest};
use futures::Stream;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Invalid modelId: {0}")]
    InvalidModel(String),

    #[error("provider request failed: {0}")]
    Http(String),

    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider stream error: {0}")]
    Stream(String),
}

/// One streaming completion call's chunk stream.
pub type ChunkStream =
    Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, ProviderError>> + Send>>;

/// Seam between the agents and the concrete provider client; test backends
/// script their chunks through the same interface.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn stream_chat(&self, request: ChatCompletionRequest) -> Result<ChunkStream, ProviderError>;
}
