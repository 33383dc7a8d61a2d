//! Error types for MCP operations.

use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("Invalid MCP config: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Tool execution failed: {0}")]
    ToolExecution(String),
}
