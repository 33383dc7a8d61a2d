//! MCP client support for the chat gateway.
//!
//! A caller's configured MCP servers are opened once per chat request,
//! their tools merged behind the built-in registry, and every session closed
//! when the request ends. A separate probe path backs the management API's
//! connectivity check.

mod bridge;
mod config;
mod error;
mod probe;
mod session;

pub use bridge::{normalize_input_schema, result_to_output, BridgedTool, McpToolBridge};
pub use config::{validate_config, McpServerConfig};
pub use error::{McpError, McpResult};
pub use probe::probe_server;
pub use session::McpSession;
