//! Streaming-chat gateway core.
//!
//! Mediates between AI SDK clients speaking the UI message-stream protocol
//! and OpenAI-compatible model providers, running a multi-round tool loop
//! over built-in tools and the caller's MCP servers.

pub mod agents;
pub mod catalog;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod provider;
pub mod routes;
pub mod server;
pub mod store;
pub mod streaming;
pub mod tools;
