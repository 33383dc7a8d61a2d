//! Agents: the multi-round chat driver and the scripted research flow.
//!
//! An agent runs as the producer task of one request, emitting events into
//! the bounded channel the SSE body drains. When the client goes away the
//! channel closes, the next send fails, and the agent unwinds without a
//! terminal event.

mod chat;
mod research;

pub use chat::ChatAgent;
pub use research::ResearchAgent;

use crate::{provider::ProviderError, streaming::SinkClosed};

/// Which agent a chat request asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    Chat,
    Research,
}

impl AgentKind {
    pub fn parse(agent_id: &str) -> Option<Self> {
        match agent_id {
            "chat" => Some(Self::Chat),
            "research" => Some(Self::Research),
            _ => None,
        }
    }
}

/// Why an agent run stopped early.
#[derive(Debug, thiserror::Error)]
enum AgentError {
    /// The client disconnected; unwind silently.
    #[error("client disconnected")]
    Disconnected,

    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl From<SinkClosed> for AgentError {
    fn from(_: SinkClosed) -> Self {
        Self::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_kind_parse() {
        assert_eq!(AgentKind::parse("chat"), Some(AgentKind::Chat));
        assert_eq!(AgentKind::parse("research"), Some(AgentKind::Research));
        assert_eq!(AgentKind::parse("deep-thought"), None);
    }
}
