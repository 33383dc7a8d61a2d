//! Connectivity probe used by the MCP management API.

use crate::{config::McpServerConfig, error::McpResult, session::McpSession};

/// Connect, list tools, and close. Returns the tool count on success.
///
/// Runs outside the chat streaming path; the caller persists the resulting
/// status and count.
pub async fn probe_server(name: &str, config: &McpServerConfig) -> McpResult<usize> {
    let session = McpSession::connect(name, config).await?;
    let listed = session.list_tools().await;
    session.close().await;
    Ok(listed?.len())
}
